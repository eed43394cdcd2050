//! The fixed query battery and the indexes that serve it
//!
//! Field names and literal values match the demo dataset (see `seed`).

use std::fmt;

use bson::{doc, oid::ObjectId, Bson, DateTime, Document};

/// Publisher looked up by name, whose books are then listed
pub const PUBLISHER_NAME: &str = "2nd Avenue Publishing, Inc.";

/// Author whose titles are listed
pub const AUTHOR: &str = "John Grisham";

/// Hex form of the user whose ratings are searched
pub const RATER_ID_HEX: &str = "525867733a93bb2198146309";

/// 2010-01-01T00:00:00Z
pub const PUBLISHED_SINCE_MILLIS: i64 = 1_262_304_000_000;

/// 2003-01-01T00:00:00Z
pub const AUTHOR_SINCE_MILLIS: i64 = 1_041_379_200_000;

/// Identifier of the user whose ratings are searched
pub fn rater_id() -> ObjectId {
    ObjectId::from_bytes([
        0x52, 0x58, 0x67, 0x73, 0x3a, 0x93, 0xbb, 0x21, 0x98, 0x14, 0x63, 0x09,
    ])
}

/// The working collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Books,
    Publishers,
}

impl Collection {
    /// All working collections, in the order indexes are dropped
    pub const ALL: [Collection; 3] = [Collection::Publishers, Collection::Users, Collection::Books];

    /// Collection name on the server
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "User",
            Collection::Books => "Book",
            Collection::Publishers => "Publisher",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What is kept from a query's results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultShape {
    /// Number of matching documents
    Count,
    /// One field of the first match
    First { field: &'static str },
    /// Number of documents returned with the projection
    Listed,
    /// Distinct `Title`s of the matches
    Titles,
}

/// A query of the battery
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryQuery {
    /// Short name, used in the comparison table
    pub label: &'static str,
    /// Sentence printed with the result
    pub caption: &'static str,
    pub collection: Collection,
    pub filter: Document,
    pub projection: Option<Document>,
    pub shape: ResultShape,
}

impl BatteryQuery {
    fn new(
        label: &'static str,
        caption: &'static str,
        collection: Collection,
        filter: Document,
        shape: ResultShape,
    ) -> Self {
        BatteryQuery {
            label,
            caption,
            collection,
            filter,
            projection: None,
            shape,
        }
    }

    fn with_projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// The `find` command body used to explain this query
    pub fn find_command(&self) -> Document {
        let mut cmd = doc! {
            "find": self.collection.name(),
            "filter": self.filter.clone(),
        };
        if let Some(p) = &self.projection {
            cmd.insert("projection", p.clone());
        }
        cmd
    }
}

/// Filter locating the publisher the battery is built around
pub fn publisher_filter() -> Document {
    doc! { "Name": PUBLISHER_NAME }
}

/// Build the battery. `publisher_id` is the `_id` of [`PUBLISHER_NAME`].
pub fn standard_battery(publisher_id: Bson) -> Vec<BatteryQuery> {
    let published_since = DateTime::from_millis(PUBLISHED_SINCE_MILLIS);
    let author_since = DateTime::from_millis(AUTHOR_SINCE_MILLIS);
    let rater = rater_id();
    let titles_only = doc! { "Title": 1, "_id": 0 };

    vec![
        BatteryQuery::new(
            "users aged 18",
            "users who are 18 years old",
            Collection::Users,
            doc! { "Age": 18 },
            ResultShape::Count,
        ),
        BatteryQuery::new(
            "user by id",
            "User with ID 3 is from",
            Collection::Users,
            doc! { "UserId": 3 },
            ResultShape::First { field: "Location.City" },
        ),
        BatteryQuery::new(
            "users over 61",
            "users over 61",
            Collection::Users,
            doc! { "Age": { "$gt": 61 } },
            ResultShape::Count,
        ),
        BatteryQuery::new(
            "users in moscow",
            "users are from Moscow",
            Collection::Users,
            doc! { "Location.City": "moscow" },
            ResultShape::Count,
        ),
        BatteryQuery::new(
            "publisher by name",
            "2nd Avenue Publishing has ID",
            Collection::Publishers,
            publisher_filter(),
            ResultShape::First { field: "_id" },
        ),
        BatteryQuery::new(
            "books by publisher",
            "books published by 2nd Avenue Publishing, Inc.",
            Collection::Books,
            doc! { "Publisher": publisher_id },
            ResultShape::Listed,
        )
        .with_projection(doc! { "Title": 1 }),
        BatteryQuery::new(
            "books since 2010",
            "books have been published since 2010",
            Collection::Books,
            doc! { "Published": { "$gt": published_since } },
            ResultShape::Count,
        ),
        BatteryQuery::new(
            "books by author",
            "Books written by John Grisham",
            Collection::Books,
            doc! { "Author": AUTHOR },
            ResultShape::Titles,
        )
        .with_projection(titles_only.clone()),
        BatteryQuery::new(
            "author since 2003",
            "Books written by John Grisham after 2003",
            Collection::Books,
            doc! { "Author": AUTHOR, "Published": { "$gt": author_since } },
            ResultShape::Titles,
        )
        .with_projection(titles_only),
        BatteryQuery::new(
            "rated a perfect 10",
            "books rated a perfect 10",
            Collection::Books,
            doc! { "Ratings.Value": { "$gte": 10 } },
            ResultShape::Count,
        ),
        BatteryQuery::new(
            "rated by user",
            "books rated by a particular user",
            Collection::Books,
            doc! { "Ratings.UserId": rater },
            ResultShape::Count,
        ),
        BatteryQuery::new(
            "user's perfect 10s",
            "books rated a perfect 10 by that user",
            Collection::Books,
            doc! { "Ratings.UserId": rater, "Ratings.Value": { "$gte": 10 } },
            ResultShape::Count,
        ),
    ]
}

/// A named secondary index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub collection: Collection,
    pub name: &'static str,
    pub keys: Document,
}

impl IndexSpec {
    fn ascending(collection: Collection, name: &'static str, fields: &[&str]) -> Self {
        let mut keys = Document::new();
        for field in fields {
            keys.insert(*field, 1);
        }
        IndexSpec { collection, name, keys }
    }

    /// Leading key of the index
    pub fn leading_field(&self) -> Option<&str> {
        self.keys.keys().next().map(String::as_str)
    }

    /// Whether the server could use this index for `query`: same collection,
    /// and the leading key is one of the filtered fields
    pub fn covers(&self, query: &BatteryQuery) -> bool {
        self.collection == query.collection
            && self
                .leading_field()
                .map(|field| query.filter.contains_key(field))
                .unwrap_or(false)
    }
}

/// The indexes created once the un-indexed timings have been shown
pub fn standard_indexes() -> Vec<IndexSpec> {
    use Collection::*;

    vec![
        IndexSpec::ascending(Books, "books_by_rating_value", &["Ratings.Value"]),
        IndexSpec::ascending(
            Books,
            "books_by_rating_userid_and_value",
            &["Ratings.UserId", "Ratings.Value"],
        ),
        IndexSpec::ascending(Books, "books_by_publisher", &["Publisher"]),
        IndexSpec::ascending(Books, "books_by_published_date", &["Published"]),
        IndexSpec::ascending(Books, "books_by_author", &["Author"]),
        IndexSpec::ascending(Users, "users_by_age", &["Age"]),
        IndexSpec::ascending(Users, "users_by_id", &["UserId"]),
        IndexSpec::ascending(Users, "users_by_city", &["Location.City"]),
        IndexSpec::ascending(Publishers, "publishers_by_name", &["Name"]),
    ]
}

/// Names of the indexes in `indexes` that could serve `query`
pub fn covering_indexes<'a>(query: &BatteryQuery, indexes: &'a [IndexSpec]) -> Vec<&'a str> {
    indexes
        .iter()
        .filter(|index| index.covers(query))
        .map(|index| index.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn battery() -> Vec<BatteryQuery> {
        standard_battery(Bson::ObjectId(ObjectId::from_bytes([7; 12])))
    }

    #[test]
    fn test_rater_id_matches_dataset() {
        assert_eq!(rater_id().to_hex(), RATER_ID_HEX);
    }

    #[test]
    fn test_date_constants() {
        let since_2010 = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        let since_2003 = Utc.with_ymd_and_hms(2003, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(since_2010.timestamp_millis(), PUBLISHED_SINCE_MILLIS);
        assert_eq!(since_2003.timestamp_millis(), AUTHOR_SINCE_MILLIS);
    }

    #[test]
    fn test_every_query_has_a_covering_index() {
        let indexes = standard_indexes();
        for query in battery() {
            assert!(
                !covering_indexes(&query, &indexes).is_empty(),
                "no index covers {}",
                query.label
            );
        }
    }

    #[test]
    fn test_compound_index_covers_by_prefix_only() {
        let indexes = standard_indexes();
        let queries = battery();

        let by_user = queries.iter().find(|q| q.label == "rated by user").unwrap();
        assert_eq!(
            covering_indexes(by_user, &indexes),
            vec!["books_by_rating_userid_and_value"]
        );

        let by_value = queries.iter().find(|q| q.label == "rated a perfect 10").unwrap();
        assert_eq!(covering_indexes(by_value, &indexes), vec!["books_by_rating_value"]);
    }

    #[test]
    fn test_index_on_other_collection_does_not_cover() {
        let age = IndexSpec::ascending(Collection::Users, "users_by_age", &["Age"]);
        let query = BatteryQuery::new("x", "x", Collection::Books, doc! { "Age": 1 }, ResultShape::Count);
        assert!(!age.covers(&query));
    }

    #[test]
    fn test_index_names_are_unique() {
        let indexes = standard_indexes();
        let mut names: Vec<&str> = indexes.iter().map(|i| i.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn test_find_command() {
        let queries = battery();
        let by_author = queries.iter().find(|q| q.label == "books by author").unwrap();
        assert_eq!(
            by_author.find_command(),
            doc! {
                "find": "Book",
                "filter": { "Author": "John Grisham" },
                "projection": { "Title": 1, "_id": 0 },
            }
        );
    }

    #[test]
    fn test_compound_index_key_order() {
        let indexes = standard_indexes();
        let compound = indexes
            .iter()
            .find(|i| i.name == "books_by_rating_userid_and_value")
            .unwrap();
        let keys: Vec<&String> = compound.keys.keys().collect();
        assert_eq!(keys, vec!["Ratings.UserId", "Ratings.Value"]);
    }
}

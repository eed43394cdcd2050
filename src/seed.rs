//! Deterministic demo dataset
//!
//! Generates users, publishers and books containing every literal the
//! query battery looks for. The same seed always yields the same documents.

use bson::{oid::ObjectId, DateTime};
use chrono::NaiveDate;
use log::{debug, info};
use mongodb::Database;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battery::{rater_id, Collection, AUTHOR, PUBLISHER_NAME};
use crate::errors::Result;

const CITIES: [&str; 10] = [
    "moscow", "berlin", "mannheim", "paris", "london", "portland", "madrid", "tokyo", "oslo", "lima",
];

const COUNTRIES: [&str; 10] = [
    "Russia", "Germany", "Germany", "France", "UK", "USA", "Spain", "Japan", "Norway", "Peru",
];

const AUTHORS: [&str; 8] = [
    AUTHOR,
    "Agatha Christie",
    "Stephen King",
    "Ursula K. Le Guin",
    "Terry Pratchett",
    "Toni Morrison",
    "Haruki Murakami",
    "Jane Austen",
];

const TITLE_WORDS: [&str; 12] = [
    "Firm", "Client", "Street", "Night", "River", "Summer", "Witness", "Garden", "Storm", "Letter",
    "Island", "Verdict",
];

const MAX_RATINGS: usize = 8;

/// Size of the generated dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedConfig {
    pub users: usize,
    pub books: usize,
    pub publishers: usize,
    pub seed: u64,
    /// Documents per `insert_many` call
    pub batch_size: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        SeedConfig {
            users: 10_000,
            books: 20_000,
            publishers: 250,
            seed: 42,
            batch_size: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Location {
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: i32,
    pub age: i32,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Publisher {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub publisher_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rating {
    pub user_id: ObjectId,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub author: String,
    pub publisher: ObjectId,
    pub published: DateTime,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub ratings: Vec<Rating>,
}

/// Totals of a dataset, as reported before a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatasetSummary {
    pub users: usize,
    pub books: usize,
    pub publishers: usize,
    pub reviews: usize,
}

/// A generated dataset, ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub users: Vec<User>,
    pub publishers: Vec<Publisher>,
    pub books: Vec<Book>,
}

impl Dataset {
    /// Generate the dataset described by `config`
    pub fn generate(config: &SeedConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let publishers: Vec<Publisher> = (0..config.publishers)
            .map(|i| Publisher {
                id: next_object_id(&mut rng),
                name: if i == 0 {
                    PUBLISHER_NAME.to_string()
                } else {
                    format!("{} House Publishing #{}", pick(&mut rng, &TITLE_WORDS), i)
                },
                publisher_id: i as i32 + 1,
            })
            .collect();

        let users: Vec<User> = (0..config.users)
            .map(|i| {
                let city = rng.gen_range(0..CITIES.len());
                User {
                    id: if i == 0 { rater_id() } else { next_object_id(&mut rng) },
                    user_id: i as i32 + 1,
                    age: rng.gen_range(14..=90),
                    location: Location {
                        city: CITIES[city].to_string(),
                        country: COUNTRIES[city].to_string(),
                    },
                }
            })
            .collect();

        let books = (0..config.books)
            .map(|i| {
                let ratings = if users.is_empty() {
                    Vec::new()
                } else {
                    let count = rng.gen_range(0..=MAX_RATINGS);
                    let mut ratings: Vec<Rating> = (0..count)
                        .map(|_| Rating {
                            user_id: users[rng.gen_range(0..users.len())].id,
                            value: rng.gen_range(1..=10),
                        })
                        .collect();
                    if i % 5 == 0 {
                        if let Some(first) = ratings.first_mut() {
                            first.user_id = users[0].id;
                        }
                    }
                    ratings
                };

                Book {
                    id: next_object_id(&mut rng),
                    title: format!(
                        "The {} of the {}",
                        pick(&mut rng, &TITLE_WORDS),
                        pick(&mut rng, &TITLE_WORDS)
                    ),
                    author: pick(&mut rng, &AUTHORS).to_string(),
                    publisher: publishers
                        .get(rng.gen_range(0..publishers.len().max(1)))
                        .map(|p| p.id)
                        .unwrap_or_else(|| next_object_id(&mut rng)),
                    published: random_date(&mut rng),
                    isbn: format!("978-{:010}", rng.gen_range(0..10_000_000_000_u64)),
                    ratings,
                }
            })
            .collect();

        Dataset {
            users,
            publishers,
            books,
        }
    }

    /// Document and review totals
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            users: self.users.len(),
            books: self.books.len(),
            publishers: self.publishers.len(),
            reviews: self.books.iter().map(|b| b.ratings.len()).sum(),
        }
    }
}

fn next_object_id(rng: &mut ChaCha8Rng) -> ObjectId {
    let mut bytes = [0u8; 12];
    rng.fill_bytes(&mut bytes);
    ObjectId::from_bytes(bytes)
}

fn pick<'a>(rng: &mut ChaCha8Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// A day between 1990 and 2015, at midnight UTC
fn random_date(rng: &mut ChaCha8Rng) -> DateTime {
    let year = rng.gen_range(1990..=2015);
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=28);
    let millis = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0);
    DateTime::from_millis(millis)
}

/// Replace the working collections with `dataset`
pub async fn load(db: &Database, dataset: &Dataset, batch_size: usize) -> Result<DatasetSummary> {
    let batch_size = batch_size.max(1);

    for collection in Collection::ALL {
        debug!("Dropping collection {}", collection);
        db.collection::<bson::Document>(collection.name()).drop(None).await?;
    }

    insert_batches(db, Collection::Publishers, &dataset.publishers, batch_size).await?;
    insert_batches(db, Collection::Users, &dataset.users, batch_size).await?;
    insert_batches(db, Collection::Books, &dataset.books, batch_size).await?;

    let summary = dataset.summary();
    info!(
        "Seeded {} users, {} publishers, {} books ({} reviews)",
        summary.users, summary.publishers, summary.books, summary.reviews
    );
    Ok(summary)
}

async fn insert_batches<T>(db: &Database, collection: Collection, docs: &[T], batch_size: usize) -> Result<()>
where
    T: Serialize + Send + Sync,
{
    let coll = db.collection::<T>(collection.name());
    for chunk in docs.chunks(batch_size) {
        coll.insert_many(chunk, None).await?;
    }
    debug!("Inserted {} documents into {}", docs.len(), collection);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SeedConfig {
        SeedConfig {
            users: 200,
            books: 500,
            publishers: 10,
            seed: 7,
            batch_size: 100,
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = Dataset::generate(&small());
        let b = Dataset::generate(&small());
        assert_eq!(a, b);
        assert_eq!(a.summary(), b.summary());
    }

    #[test]
    fn test_summary_matches_requested_totals() {
        let dataset = Dataset::generate(&small());
        let summary = dataset.summary();
        assert_eq!(summary.users, 200);
        assert_eq!(summary.books, 500);
        assert_eq!(summary.publishers, 10);
        assert!(summary.reviews <= 500 * MAX_RATINGS);
    }

    #[test]
    fn test_other_seed_differs() {
        let a = Dataset::generate(&small());
        let b = Dataset::generate(&SeedConfig { seed: 8, ..small() });
        assert_ne!(a, b);
    }

    #[test]
    fn test_battery_literals_present() {
        let dataset = Dataset::generate(&small());

        assert_eq!(dataset.publishers[0].name, PUBLISHER_NAME);
        assert_eq!(dataset.users[0].id, rater_id());
        assert!(dataset.users.iter().any(|u| u.user_id == 3));
        assert!(dataset.books.iter().any(|b| b.author == AUTHOR));
        assert!(dataset
            .books
            .iter()
            .any(|b| b.ratings.iter().any(|r| r.user_id == rater_id())));
    }

    #[test]
    fn test_value_ranges() {
        let dataset = Dataset::generate(&small());
        let low = NaiveDate::from_ymd_opt(1990, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
            .and_utc()
            .timestamp_millis();

        for user in &dataset.users {
            assert!((14..=90).contains(&user.age));
        }
        for book in &dataset.books {
            assert!(book.ratings.len() <= MAX_RATINGS);
            assert!(book.ratings.iter().all(|r| (1..=10).contains(&r.value)));
            assert!(book.published.timestamp_millis() >= low);
        }
    }

    #[test]
    fn test_field_names_match_queries() {
        let dataset = Dataset::generate(&small());
        let user = bson::to_document(&dataset.users[0]).unwrap();
        let book = bson::to_document(&dataset.books[0]).unwrap();

        assert_eq!(user.get_object_id("_id").unwrap(), rater_id());
        assert!(user.get_document("Location").unwrap().contains_key("City"));
        assert!(user.contains_key("UserId"));
        assert!(book.contains_key("Publisher"));
        assert!(book.contains_key("Published"));
        assert!(book.contains_key("ISBN"));
        assert!(book.get_array("Ratings").is_ok());
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::generate(&SeedConfig {
            users: 0,
            books: 3,
            publishers: 0,
            ..small()
        });
        assert_eq!(dataset.summary().reviews, 0);
        assert_eq!(dataset.books.len(), 3);
    }
}

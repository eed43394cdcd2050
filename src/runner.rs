//! Benchmark runner
//!
//! Drives the demonstration against a live server: drop indexes, profile
//! the battery, explain every query, build indexes, then do it all again.

use std::collections::BTreeSet;

use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use log::{debug, info, warn};
use mongodb::options::{FindOneOptions, FindOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};

use crate::battery::{self, covering_indexes, BatteryQuery, Collection, IndexSpec, ResultShape};
use crate::config::BenchConfig;
use crate::console::{group_thousands, print_flush, Pacer, Palette};
use crate::errors::{BenchError, Result};
use crate::plan::{interpret_plan, AccessPath, PlanSummary};
use crate::profile::{slowest, ProfileEntry, ProfilingLevel, PROFILE_COLLECTION};
use crate::report::{BatteryReport, Comparison};
use crate::value::{self, get_i64};

/// Baseline size of the working dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSize {
    pub books: u64,
    pub reviews: u64,
}

/// What a query returned, reduced to what gets printed
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Count(u64),
    First(Bson),
    Listed(usize),
    Titles(BTreeSet<String>),
}

/// Everything a full run measured
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub dataset: DatasetSize,
    pub slow_without_indexes: Vec<ProfileEntry>,
    pub slow_with_indexes: Vec<ProfileEntry>,
    pub without_indexes: BatteryReport,
    pub with_indexes: BatteryReport,
}

/// Runs the demonstration against one database
pub struct BenchmarkRunner {
    db: Database,
    config: BenchConfig,
    palette: Palette,
}

impl BenchmarkRunner {
    /// Connect to the server named in `config`
    pub async fn connect(config: BenchConfig, palette: Palette) -> Result<Self> {
        info!("Connecting to {}", config.uri);
        let client = Client::with_uri_str(&config.uri).await?;
        let db = client.database(&config.database);
        Ok(Self::from_database(db, config, palette))
    }

    /// Use an already opened database handle
    pub fn from_database(db: Database, config: BenchConfig, palette: Palette) -> Self {
        BenchmarkRunner { db, config, palette }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection(collection.name())
    }

    /// Count books and the ratings embedded in them
    pub async fn show_data_size(&self) -> Result<DatasetSize> {
        let p = &self.palette;
        println!("{}", p.bold("Computing data set size..."));

        let books_coll = self.collection(Collection::Books);
        let books = books_coll.count_documents(doc! {}, None).await?;
        println!("{}{}", p.highlight(&group_thousands(books)), p.subdue(" books"));

        let pipeline = vec![
            doc! { "$project": {
                "_id": 0,
                "n": { "$cond": [{ "$isArray": "$Ratings" }, { "$size": "$Ratings" }, 0] },
            } },
            doc! { "$group": { "_id": Bson::Null, "reviews": { "$sum": "$n" } } },
        ];
        let mut cursor = books_coll.aggregate(pipeline, None).await?;
        let reviews = match cursor.try_next().await? {
            Some(totals) => get_i64(&totals, "reviews")
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0),
            None => 0,
        };
        println!("{}{}", p.highlight(&group_thousands(reviews)), p.subdue(" reviews"));
        println!();

        Ok(DatasetSize { books, reviews })
    }

    /// Drop every secondary index on the working collections
    pub async fn reset_indexes(&self) -> Result<()> {
        print_flush(&self.palette.bold("Removing indexes ... "))?;
        for collection in Collection::ALL {
            debug!("Dropping indexes of {}", collection);
            self.collection(collection).drop_indexes(None).await?;
        }
        println!("{}", self.palette.subdue("done."));
        Ok(())
    }

    /// Turn profiling off and clear its log, then optionally re-enable it
    /// for operations slower than `threshold_ms`
    pub async fn reset_profiling(&self, enabled: bool, threshold_ms: i64) -> Result<()> {
        let p = &self.palette;

        print_flush(&p.bold("Resetting profiling ... "))?;
        self.db.run_command(ProfilingLevel::Off.command(None), None).await?;
        self.db
            .collection::<Document>(PROFILE_COLLECTION)
            .drop(None)
            .await?;
        println!("{}", p.subdue("done."));

        if enabled {
            print_flush(&p.bold("Enabling profiling for slow queries ... "))?;
            self.db
                .run_command(ProfilingLevel::SlowOnly.command(Some(threshold_ms)), None)
                .await?;
            println!("{}", p.subdue("done."));
            info!("Profiling operations slower than {} ms", threshold_ms);
        }
        Ok(())
    }

    /// Find the publisher the battery is built around
    pub async fn lookup_publisher(&self) -> Result<Bson> {
        let publisher = self
            .collection(Collection::Publishers)
            .find_one(battery::publisher_filter(), None)
            .await?
            .ok_or_else(|| BenchError::NotFound(format!("publisher {:?}", battery::PUBLISHER_NAME)))?;

        publisher
            .get("_id")
            .cloned()
            .ok_or_else(|| BenchError::NotFound("_id of the battery publisher".to_string()))
    }

    /// Build the battery for the current dataset
    pub async fn battery(&self) -> Result<Vec<BatteryQuery>> {
        let publisher_id = self.lookup_publisher().await?;
        Ok(battery::standard_battery(publisher_id))
    }

    /// Issue a battery query and keep only what gets reported
    pub async fn execute(&self, query: &BatteryQuery) -> Result<Outcome> {
        debug!("{} {}: {}", query.collection, query.label, query.filter);
        let coll = self.collection(query.collection);

        let outcome = match &query.shape {
            ResultShape::Count => {
                Outcome::Count(coll.count_documents(query.filter.clone(), None).await?)
            }
            ResultShape::First { field } => {
                let options = FindOneOptions::builder()
                    .projection(query.projection.clone())
                    .build();
                let found = coll
                    .find_one(query.filter.clone(), options)
                    .await?
                    .ok_or_else(|| {
                        BenchError::NotFound(format!("{} matching {}", query.collection, query.filter))
                    })?;
                let value = value::get_path(&found, field).cloned().ok_or_else(|| {
                    BenchError::NotFound(format!("field {} in {}", field, query.collection))
                })?;
                Outcome::First(value)
            }
            ResultShape::Listed => Outcome::Listed(self.find_all(query).await?.len()),
            ResultShape::Titles => {
                let titles = self
                    .find_all(query)
                    .await?
                    .iter()
                    .filter_map(|doc| doc.get_str("Title").ok())
                    .map(str::to_string)
                    .collect();
                Outcome::Titles(titles)
            }
        };
        Ok(outcome)
    }

    async fn find_all(&self, query: &BatteryQuery) -> Result<Vec<Document>> {
        let options = FindOptions::builder()
            .projection(query.projection.clone())
            .build();
        let docs: Vec<Document> = self
            .collection(query.collection)
            .find(query.filter.clone(), options)
            .await?
            .try_collect()
            .await?;
        Ok(docs)
    }

    /// Ask the server how it runs `query`
    pub async fn explain(&self, query: &BatteryQuery) -> Result<PlanSummary> {
        let command = doc! {
            "explain": query.find_command(),
            "verbosity": "executionStats",
        };
        let explained = self.db.run_command(command, None).await?;
        debug!("Plan for {}: {}", query.label, explained);
        Ok(interpret_plan(&explained))
    }

    /// Issue every query once; only the profiling entries matter
    pub async fn run_query_battery(&self, queries: &[BatteryQuery]) -> Result<()> {
        print_flush(&self.palette.bold("Running standard queries (generates profiling data) ... "))?;
        for query in queries {
            self.execute(query).await?;
        }
        println!("{}", self.palette.subdue("done."));
        Ok(())
    }

    /// Print the slowest profiled queries, slowest first
    pub async fn show_slow_queries(&self, limit: usize) -> Result<Vec<ProfileEntry>> {
        let p = &self.palette;
        println!(
            "{}",
            p.bold(&format!(
                "Displaying top {} worst queries (slower than {} ms) ...",
                limit, self.config.slow_ms
            ))
        );

        let docs: Vec<Document> = self
            .db
            .collection::<Document>(PROFILE_COLLECTION)
            .find(doc! {}, None)
            .await?
            .try_collect()
            .await?;
        let entries: Vec<ProfileEntry> = docs.iter().map(ProfileEntry::from_document).collect();
        let found = entries.iter().filter(|e| e.is_query()).count();
        let worst = slowest(entries, limit);

        println!("{}", p.subdue(&format!("Found {} bad queries", found)));
        for entry in &worst {
            println!(
                "{}{}{}{}",
                p.subdue("time: "),
                p.highlight(&format!("{}ms", group_thousands(entry.millis))),
                p.subdue(&format!(", coll: {}, query: ", entry.collection())),
                p.notice(&entry.payload_text()),
            );
        }
        println!("{}", p.subdue("done."));
        Ok(worst)
    }

    /// Re-issue the battery, explaining every query and summing the
    /// execution times the server reports
    pub async fn show_timings_and_plans(
        &self,
        queries: &[BatteryQuery],
        with_indexes: bool,
    ) -> Result<BatteryReport> {
        let p = &self.palette;
        let header = if with_indexes {
            "Showing query times and plans with results (should be faster) ..."
        } else {
            "Showing query times and plans with results (should be slow) ..."
        };
        println!("{}", p.highlight(header));

        let indexes = battery::standard_indexes();
        let mut report = BatteryReport::new(with_indexes);

        for query in queries {
            let outcome = self.execute(query).await?;
            self.print_outcome(query, &outcome);

            let plan = self.explain(query).await?;
            self.print_plan(&plan);
            if with_indexes && !plan.has_index() && !covering_indexes(query, &indexes).is_empty() {
                warn!("{} still scans the collection although an index covers it", query.label);
            }
            report.push(query.label, plan);
            println!();
        }

        println!(
            "{}{}{}",
            p.subdue("done, total time: "),
            p.highlight(&group_thousands(report.total_millis())),
            p.subdue(" ms."),
        );
        Ok(report)
    }

    fn print_outcome(&self, query: &BatteryQuery, outcome: &Outcome) {
        let p = &self.palette;
        match outcome {
            Outcome::Count(n) => {
                println!("{} {}", p.highlight(&group_thousands(*n)), p.subdue(query.caption));
            }
            Outcome::Listed(n) => {
                println!("{} {}", p.highlight(&group_thousands(*n as u64)), p.subdue(query.caption));
            }
            Outcome::First(v) => {
                println!("{} {}", p.subdue(query.caption), p.highlight(&value::display(v)));
            }
            Outcome::Titles(titles) => {
                println!(
                    "{}{}",
                    p.subdue(&format!("{}, count: ", query.caption)),
                    p.highlight(&titles.len().to_string())
                );
                let listed: Vec<&str> = titles.iter().map(String::as_str).collect();
                println!("{}", p.notice(&listed.join(", ")));
            }
        }
    }

    fn print_plan(&self, plan: &PlanSummary) {
        let p = &self.palette;
        let time = match plan.execution_millis {
            Some(ms) => format!("{} ms", ms),
            None => "unknown ms".to_string(),
        };
        match &plan.access {
            AccessPath::Index(name) => println!(
                "{}{}{}{}{}",
                p.notice("INDEXED"),
                p.subdue(": time: "),
                p.highlight(&time),
                p.subdue(", index: "),
                p.highlight(name),
            ),
            AccessPath::Scan(stage) => println!(
                "{}{}{}{}{}",
                p.notice("No index"),
                p.subdue(": time: "),
                p.highlight(&time),
                p.subdue(", index: NO INDEX, stage: "),
                p.highlight(stage),
            ),
        }
    }

    /// Create the named secondary indexes
    pub async fn build_indexes(&self, indexes: &[IndexSpec]) -> Result<()> {
        print_flush(&self.palette.bold("Adding indexes (this is s.l.o.w.) ... "))?;
        for spec in indexes {
            let model = IndexModel::builder()
                .keys(spec.keys.clone())
                .options(IndexOptions::builder().name(spec.name.to_string()).build())
                .build();
            self.collection(spec.collection).create_index(model, None).await?;
            debug!("Created index {} on {}", spec.name, spec.collection);
        }
        println!("{}", self.palette.subdue("done."));
        Ok(())
    }

    /// Run the whole demonstration, pausing between phases
    pub async fn run(&self, pacer: &mut dyn Pacer) -> Result<RunSummary> {
        let slow_ms = self.config.slow_ms;
        let limit = self.config.slow_limit;

        let dataset = self.show_data_size().await?;
        let queries = self.battery().await?;

        info!("Phase 1: without indexes");
        self.reset_indexes().await?;
        self.reset_profiling(true, slow_ms).await?;
        self.run_query_battery(&queries).await?;
        pacer.pause("see bad queries -----")?;
        let slow_without_indexes = self.show_slow_queries(limit).await?;
        pacer.pause("display times -------")?;
        let without_indexes = self.show_timings_and_plans(&queries, false).await?;

        info!("Phase 2: with indexes");
        pacer.pause("add indexes ---------")?;
        self.build_indexes(&battery::standard_indexes()).await?;
        self.reset_profiling(true, slow_ms).await?;
        self.run_query_battery(&queries).await?;
        let slow_with_indexes = self.show_slow_queries(limit).await?;
        pacer.pause("display times -------")?;
        let with_indexes = self.show_timings_and_plans(&queries, true).await?;
        println!();

        self.print_comparison(&without_indexes, &with_indexes);

        Ok(RunSummary {
            dataset,
            slow_without_indexes,
            slow_with_indexes,
            without_indexes,
            with_indexes,
        })
    }

    fn print_comparison(&self, before: &BatteryReport, after: &BatteryReport) {
        let p = &self.palette;
        let comparison = Comparison::new(before, after);

        println!("{}", p.bold("Comparing timings ..."));
        print!("{}", comparison);
        println!(
            "{}{}{}",
            p.subdue("indexed plans: "),
            p.highlight(&format!("{} / {}", after.indexed_count(), after.timings.len())),
            p.subdue(&format!(" (before: {})", before.indexed_count())),
        );
        match comparison.speedup() {
            Some(factor) => println!(
                "{}{}",
                p.subdue("total speedup: "),
                p.highlight(&format!("x{:.1}", factor))
            ),
            None => println!("{}", p.subdue("total speedup: n/a")),
        }
    }
}

#![allow(
    clippy::arithmetic_side_effects,
    clippy::cast_precision_loss,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items
)]

//! Probe statistics for the built-in hash strategies.
//!
//! For a word corpus (one word per line in the file given as the first
//! argument, or a built-in list of common English words):
//!
//! - hashes every word into tables of prime sizes and reports Pearson's
//!   chi-square statistic per degree of freedom (close to 1 means uniform),
//! - inserts the corpus into a table and reports the maximum and mean number of
//!   key comparisons per lookup,
//! - plots the uniformity results to `uniformity.png`.

use std::{env, error::Error, fs};

use plotters::prelude::*;
use primehash::{Crc32Hash, HashStrategy, HashTable, Key, PrimeModHash, TableError, is_prime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MIN_TABLE_SIZE: usize = 11;
const MAX_TABLE_SIZE: usize = 256;
const PLOT_PATH: &str = "uniformity.png";

const BUILTIN_CORPUS: [&str; 100] = [
    "the", "of", "and", "to", "a", "in", "for", "is", "on", "that", "by", "this", "with", "i",
    "you", "it", "not", "or", "be", "are", "from", "at", "as", "your", "all", "have", "new",
    "more", "an", "was", "we", "will", "home", "can", "us", "about", "if", "page", "my", "has",
    "search", "free", "but", "our", "one", "other", "do", "no", "information", "time", "they",
    "site", "he", "up", "may", "what", "which", "their", "news", "out", "use", "any", "there",
    "see", "only", "so", "his", "when", "contact", "here", "business", "who", "web", "also",
    "now", "help", "get", "pm", "view", "online", "c", "e", "first", "am", "been", "would", "how",
    "were", "me", "s", "services", "some", "these", "click", "its", "like", "service", "x",
    "than", "find",
];

/// Chi-square results of one strategy over every sampled table size
#[derive(Debug)]
struct Uniformity {
    strategy: &'static str,
    /// `(table size, chi-square / degrees of freedom)`
    points: Vec<(usize, f64)>,
}

/// Lookup cost of one strategy over the corpus
#[derive(Debug)]
struct ComparisonStats {
    strategy: &'static str,
    max: u64,
    mean: f64,
}

fn load_corpus() -> Result<Vec<String>, Box<dyn Error>> {
    match env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)?;
            let words: Vec<String> = text
                .lines()
                .map(str::trim)
                .filter(|word| !word.is_empty())
                .map(str::to_owned)
                .collect();
            info!(%path, words = words.len(), "loaded corpus");
            Ok(words)
        }
        None => Ok(BUILTIN_CORPUS.iter().map(|word| (*word).to_owned()).collect()),
    }
}

/// Pearson's chi-square statistic of the bucket counts of `keys` in a table of `size` slots
fn chi_square(strategy: &dyn HashStrategy, keys: &[Key], size: usize, salt: u64) -> f64 {
    let mut buckets = vec![0_usize; size];
    for key in keys {
        buckets[strategy.hash(key, size, salt) % size] += 1;
    }

    let expected = keys.len() as f64 / size as f64;
    buckets
        .iter()
        .map(|&observed| {
            let deviation = observed as f64 - expected;
            deviation * deviation / expected
        })
        .sum()
}

fn uniformity(table: &HashTable<usize>, keys: &[Key]) -> Uniformity {
    let strategy = table.hash_function();
    let salt = table.salts().primary;

    let points = (MIN_TABLE_SIZE..=MAX_TABLE_SIZE)
        .filter(|&size| is_prime(size))
        .map(|size| {
            let degrees_of_freedom = (size - 1) as f64;
            (size, chi_square(strategy, keys, size, salt) / degrees_of_freedom)
        })
        .collect();

    Uniformity { strategy: strategy.name(), points }
}

fn comparison_stats(table: &HashTable<usize>, words: &[String]) -> Result<ComparisonStats, TableError> {
    let mut max = 0;
    let mut total = 0;
    for word in words {
        table.reset_comparison_count();
        table.get(word)?;
        let count = table.comparison_count();
        max = max.max(count);
        total += count;
    }

    Ok(ComparisonStats {
        strategy: table.hash_function().name(),
        max,
        mean: total as f64 / words.len() as f64,
    })
}

fn plot(results: &[Uniformity]) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(PLOT_PATH, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_y = results
        .iter()
        .flat_map(|result| result.points.iter().map(|&(_, y)| y))
        .fold(1.0, f64::max) *
        1.1; // Add 10% margin

    let mut chart = ChartBuilder::on(&root)
        .caption("Hash Strategy Uniformity", ("sans-serif", 35))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(MIN_TABLE_SIZE..MAX_TABLE_SIZE, 0.0..max_y)?;

    chart
        .configure_mesh()
        .x_desc("Table Size (prime)")
        .y_desc("Chi-square / Degrees of Freedom")
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    // A perfectly uniform hash sits around 1
    let reference_style = ShapeStyle::from(&BLACK.mix(0.3)).stroke_width(1);
    chart
        .draw_series(LineSeries::new(
            vec![(MIN_TABLE_SIZE, 1.0), (MAX_TABLE_SIZE, 1.0)],
            reference_style,
        ))?
        .label("Uniform")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], reference_style));

    let colors = [RGBColor(220, 50, 50), RGBColor(50, 90, 220)];
    for (result, color) in results.iter().zip(colors.iter().cycle()) {
        let line_style = ShapeStyle::from(color).stroke_width(2);
        chart
            .draw_series(LineSeries::new(result.points.iter().copied(), line_style))?
            .label(result.strategy)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let words = load_corpus()?;
    if words.is_empty() {
        warn!("corpus is empty, nothing to measure");
        return Ok(());
    }
    let keys: Vec<Key> = words.iter().map(|word| Key::from(word.as_str())).collect();

    let mut tables = [HashTable::with_strategy(PrimeModHash), HashTable::with_strategy(Crc32Hash)];
    let mut results = Vec::with_capacity(tables.len());

    for table in &mut tables {
        for (position, word) in words.iter().enumerate() {
            table.set(word, position)?;
        }

        let stats = comparison_stats(table, &words)?;
        println!(
            "{}: {} pairs in {} slots, max comparisons = {}, mean comparisons = {:.3}",
            stats.strategy,
            table.len(),
            table.capacity(),
            stats.max,
            stats.mean
        );

        let result = uniformity(table, &keys);
        let (worst_size, worst) = result
            .points
            .iter()
            .copied()
            .fold((0, 0.0), |worst, point| if point.1 > worst.1 { point } else { worst });
        println!(
            "{}: worst chi-square/dof = {:.3} at table size {}",
            result.strategy, worst, worst_size
        );
        results.push(result);
    }

    plot(&results)?;
    info!(path = PLOT_PATH, "wrote uniformity plot");

    Ok(())
}

use anyhow::{Context, Result, bail};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

const MIN_N: usize = 1 << 5;
const MAX_N: usize = 1 << 20;
const REPEATS: usize = 30;
const SEED: u64 = 0x1_2345_6789;
const OUTPUT: &str = "compares.csv";

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Row {
    num_items: usize,
    num_compares: u64,
}

/// Quicksort with the first element as pivot. The remaining elements are
/// split, order preserved, into `< pivot` and `>= pivot`; each element costs
/// one comparison. Returns the total number of comparisons.
fn quicksort(values: &mut Vec<i64>) -> u64 {
    if values.len() <= 1 {
        return 0;
    }
    let pivot = values[0];
    let (mut less, mut greater_or_equal): (Vec<i64>, Vec<i64>) =
        values[1..].iter().copied().partition(|&v| v < pivot);

    let mut compares = (values.len() - 1) as u64;
    compares += quicksort(&mut greater_or_equal);
    compares += quicksort(&mut less);

    values.clear();
    values.extend(less);
    values.push(pivot);
    values.extend(greater_or_equal);
    compares
}

fn is_sorted(values: &[i64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

/// Sort `repeats` shuffles of `0..n` for every power of two n in
/// `min_n..=max_n`.
fn count_number_of_compares(
    min_n: usize,
    max_n: usize,
    repeats: usize,
    rng: &mut StdRng,
) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let mut n = min_n;

    while n <= max_n {
        info!("n={n}");
        let mut values: Vec<i64> = (0..n as i64).collect();

        for _ in 0..repeats {
            values.shuffle(rng);

            let mut list = values.clone();
            let num_compares = quicksort(&mut list);
            if !is_sorted(&list) {
                bail!("list of {n} items is not sorted");
            }

            rows.push(Row {
                num_items: n,
                num_compares,
            });
        }
        n *= 2;
    }

    Ok(rows)
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(SEED);
    let rows = count_number_of_compares(MIN_N, MAX_N, REPEATS, &mut rng)?;

    let mut writer = csv::Writer::from_path(OUTPUT).context("creating output file")?;
    for row in &rows {
        writer.serialize(row).context("writing row")?;
    }
    writer.flush().context("flushing output file")?;

    println!("Wrote {} measurements to {OUTPUT}", rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_one_comparison_per_partitioned_element() {
        let mut values = vec![3, 1, 2, 4];
        // pivot 3: 3 compares; [1, 2]: 1 compare; [2], [4]: none
        assert_eq!(quicksort(&mut values), 4);
        assert_eq!(values, vec![1, 2, 3, 4]);
    }

    #[test]
    fn trivial_lists_need_no_comparisons() {
        assert_eq!(quicksort(&mut vec![]), 0);
        assert_eq!(quicksort(&mut vec![7]), 0);
    }

    #[test]
    fn sorted_input_is_the_quadratic_worst_case() {
        let mut values: Vec<i64> = (0..50).collect();
        assert_eq!(quicksort(&mut values), 50 * 49 / 2);
        assert!(is_sorted(&values));
    }

    #[test]
    fn duplicates_go_right_of_the_pivot() {
        let mut values = vec![2, 2, 1, 2];
        quicksort(&mut values);
        assert_eq!(values, vec![1, 2, 2, 2]);
    }

    #[test]
    fn experiment_is_reproducible() {
        let run = || {
            let mut rng = StdRng::seed_from_u64(SEED);
            count_number_of_compares(8, 64, 3, &mut rng).unwrap()
        };
        let rows = run();

        assert_eq!(rows.len(), 4 * 3);
        assert_eq!(rows[0].num_items, 8);
        assert_eq!(rows.last().unwrap().num_items, 64);
        assert!(rows.iter().all(|r| r.num_compares >= (r.num_items - 1) as u64));
        assert_eq!(rows, run());
    }

    #[test]
    fn rows_serialize_with_the_plot_header() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .serialize(Row {
                num_items: 32,
                num_compares: 170,
            })
            .unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, "num_items,num_compares\n32,170\n");
    }
}

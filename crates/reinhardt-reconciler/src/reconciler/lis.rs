//! Longest increasing subsequence.
//!
//! The keyed diff records, for each new child, the old position it was matched with.
//! Children on a longest increasing run of those positions are already in relative
//! order and stay put; every other matched child is moved.

/// Returns the positions, in ascending order, of one longest strictly increasing
/// subsequence of the `Some` values in `sources`. `None` entries are skipped.
pub fn longest_increasing_subsequence(sources: &[Option<usize>]) -> Vec<usize> {
	let mut predecessors: Vec<Option<usize>> = vec![None; sources.len()];
	// tails[k] is the position ending the best run of length k + 1 found so far
	let mut tails: Vec<usize> = Vec::new();
	let mut tail_values: Vec<usize> = Vec::new();

	for (position, source) in sources.iter().enumerate() {
		let Some(value) = *source else {
			continue;
		};
		let slot = tail_values.partition_point(|&tail| tail < value);
		if slot > 0 {
			predecessors[position] = Some(tails[slot - 1]);
		}
		if slot == tails.len() {
			tails.push(position);
			tail_values.push(value);
		} else {
			tails[slot] = position;
			tail_values[slot] = value;
		}
	}

	let mut result = Vec::with_capacity(tails.len());
	let mut cursor = tails.last().copied();
	while let Some(position) = cursor {
		result.push(position);
		cursor = predecessors[position];
	}
	result.reverse();
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;

	fn lis_len_quadratic(values: &[usize]) -> usize {
		let mut best = vec![1usize; values.len()];
		for i in 0..values.len() {
			for j in 0..i {
				if values[j] < values[i] {
					best[i] = best[i].max(best[j] + 1);
				}
			}
		}
		best.into_iter().max().unwrap_or(0)
	}

	#[rstest]
	#[case(vec![], vec![])]
	#[case(vec![Some(0)], vec![0])]
	#[case(vec![Some(3), Some(1), Some(2)], vec![1, 2])]
	#[case(vec![Some(2), None, Some(0), Some(1), None], vec![2, 3])]
	#[case(vec![None, None], vec![])]
	#[case(vec![Some(0), Some(1), Some(2), Some(3)], vec![0, 1, 2, 3])]
	#[case(vec![Some(3), Some(2), Some(1), Some(0)], vec![3])]
	fn test_known_sequences(#[case] sources: Vec<Option<usize>>, #[case] expected: Vec<usize>) {
		assert_eq!(longest_increasing_subsequence(&sources), expected);
	}

	proptest! {
		#[test]
		fn prop_result_is_a_longest_increasing_run(
			sources in proptest::collection::vec(proptest::option::of(0usize..50), 0..40)
		) {
			let positions = longest_increasing_subsequence(&sources);

			let values: Vec<usize> = positions.iter().map(|&p| sources[p].unwrap()).collect();
			prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
			prop_assert!(values.windows(2).all(|w| w[0] < w[1]));

			let present: Vec<usize> = sources.iter().flatten().copied().collect();
			prop_assert_eq!(positions.len(), lis_len_quadratic(&present));
		}
	}
}

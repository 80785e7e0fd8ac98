///
/// CartesianProduct
///
/// Lazy odometer over one selection per input set. Both the canonicalizer's
/// AND-over-OR distribution and the splitter enumerate combinations through
/// this iterator, so peak memory stays bounded for wide trees: only the
/// current selection is materialized.
///

pub(crate) struct CartesianProduct<'a, T> {
    sets: &'a [Vec<T>],
    cursor: Vec<usize>,
    exhausted: bool,
}

impl<'a, T> CartesianProduct<'a, T> {
    pub(crate) fn new(sets: &'a [Vec<T>]) -> Self {
        Self {
            cursor: vec![0; sets.len()],
            exhausted: sets.iter().any(Vec::is_empty),
            sets,
        }
    }
}

impl<'a, T> Iterator for CartesianProduct<'a, T> {
    type Item = Vec<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let selection = self
            .cursor
            .iter()
            .zip(self.sets)
            .map(|(&index, set)| &set[index])
            .collect();

        // Advance the rightmost wheel; carry leftward on wraparound.
        self.exhausted = true;
        for (index, set) in self.cursor.iter_mut().zip(self.sets).rev() {
            *index += 1;
            if *index < set.len() {
                self.exhausted = false;
                break;
            }
            *index = 0;
        }

        Some(selection)
    }
}

/// Total combination count, saturating so callers can guard against
/// multiplicative blow-up before enumerating.
#[must_use]
pub(crate) fn product_len<T>(sets: &[Vec<T>]) -> usize {
    sets.iter()
        .fold(1usize, |acc, set| acc.saturating_mul(set.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_every_combination_in_order() {
        let sets = vec![vec![1, 2], vec![10], vec![100, 200]];
        let combos: Vec<Vec<i32>> = CartesianProduct::new(&sets)
            .map(|selection| selection.into_iter().copied().collect())
            .collect();

        assert_eq!(
            combos,
            vec![
                vec![1, 10, 100],
                vec![1, 10, 200],
                vec![2, 10, 100],
                vec![2, 10, 200],
            ]
        );
        assert_eq!(product_len(&sets), 4);
    }

    #[test]
    fn empty_input_yields_one_empty_selection() {
        let sets: Vec<Vec<i32>> = vec![];
        let combos: Vec<_> = CartesianProduct::new(&sets).collect();
        assert_eq!(combos.len(), 1);
        assert!(combos[0].is_empty());
    }

    #[test]
    fn any_empty_set_empties_the_product() {
        let sets = vec![vec![1, 2], vec![]];
        assert_eq!(CartesianProduct::new(&sets).count(), 0);
        assert_eq!(product_len(&sets), 0);
    }
}

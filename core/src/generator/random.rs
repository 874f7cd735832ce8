use super::*;

/// Uniformly random placement that keeps a zone around the starting cell clear.
///
/// Candidate cells outside the zone are partially shuffled and the first `mines` of them receive a mine, so the
/// work is bounded by the grid size no matter how dense the board is.
#[derive(Clone, Debug, PartialEq)]
pub struct SafeStartGenerator {
    seed: u64,
    start: Coord2,
    zone: SafeZone,
}

impl SafeStartGenerator {
    pub fn new(seed: u64, start: Coord2, zone: SafeZone) -> Self {
        Self { seed, start, zone }
    }
}

impl MineGenerator for SafeStartGenerator {
    fn generate(self, difficulty: &Difficulty) -> MineLayout {
        use rand::prelude::*;

        let size = difficulty.size();
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());
        let mines = usize::from(difficulty.mines);
        let window_len = mine_mask.iter_window(self.start).count();

        let zone = match self.zone {
            SafeZone::Window if mines + window_len > mine_mask.len() => {
                log::warn!(
                    "Cannot keep the neighborhood of {:?} clear with {} mines, fallback to a safe cell",
                    self.start,
                    mines
                );
                SafeZone::Cell
            }
            zone => zone,
        };

        // the mask doubles as the exclusion marker until the candidates are collected
        match zone {
            SafeZone::Cell => mine_mask[self.start.to_nd_index()] = true,
            SafeZone::Window => {
                for coords in mine_mask.iter_window(self.start) {
                    mine_mask[coords.to_nd_index()] = true;
                }
            }
        }
        let mut candidates: Vec<Coord2> = mine_mask
            .indexed_iter()
            .filter(|&(_, &excluded)| !excluded)
            .map(|((row, col), _)| (row as Coord, col as Coord))
            .collect();
        mine_mask.fill(false);

        if mines > candidates.len() {
            log::warn!(
                "Requested {} mines but only {} cells are available",
                mines,
                candidates.len()
            );
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let (chosen, _) = candidates.partial_shuffle(&mut rng, mines);
        for &coords in chosen.iter() {
            mine_mask[coords.to_nd_index()] = true;
        }

        let layout = MineLayout::from_mine_mask(mine_mask);
        log::debug!(
            "Placed {} mines on a {:?} grid, start {:?} kept clear ({:?})",
            layout.mine_count(),
            size,
            self.start,
            zone
        );
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_is_clear(layout: &MineLayout, start: Coord2) -> bool {
        let size = layout.size();
        let probe: Array2<bool> = Array2::default(size.to_nd_index());
        probe.iter_window(start).all(|pos| !layout.contains_mine(pos))
    }

    #[test]
    fn places_exact_mine_count_outside_window() {
        let difficulty = Difficulty::beginner();
        for seed in 0..64 {
            let start = ((seed % 9) as Coord, (seed / 7 % 9) as Coord);
            let layout = SafeStartGenerator::new(seed, start, SafeZone::Window).generate(&difficulty);
            assert_eq!(layout.mine_count(), 10);
            assert!(window_is_clear(&layout, start), "seed {seed}");
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let difficulty = Difficulty::intermediate();
        let a = SafeStartGenerator::new(7, (3, 3), SafeZone::Window).generate(&difficulty);
        let b = SafeStartGenerator::new(7, (3, 3), SafeZone::Window).generate(&difficulty);
        assert_eq!(a, b);
    }

    #[test]
    fn densest_board_that_fits_window_fills_everything_else() {
        // 81 cells, 9 in the window, 72 mines leave nothing else
        let difficulty = Difficulty::custom(9, 9, 72);
        let layout = SafeStartGenerator::new(1, (4, 4), SafeZone::Window).generate(&difficulty);
        assert_eq!(layout.mine_count(), 72);
        assert!(window_is_clear(&layout, (4, 4)));
    }

    #[test]
    fn dense_board_falls_back_to_safe_cell() {
        let difficulty = Difficulty::custom(3, 3, 8);
        let layout = SafeStartGenerator::new(3, (1, 1), SafeZone::Window).generate(&difficulty);
        assert_eq!(layout.mine_count(), 8);
        assert!(!layout.contains_mine((1, 1)));
    }

    #[test]
    fn corner_start_clears_clipped_window() {
        let difficulty = Difficulty::custom(4, 4, 12);
        let layout = SafeStartGenerator::new(9, (0, 0), SafeZone::Window).generate(&difficulty);
        assert_eq!(layout.mine_count(), 12);
        assert!(window_is_clear(&layout, (0, 0)));
    }
}

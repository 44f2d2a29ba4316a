//! Hazard board generation and rigging mutation
//!
//! Cells are flat indices `0..width*height`. Generation places hazards by
//! rejection-sampling whichever of the hazard or safe sets is cheaper to
//! enumerate, then fills the complement. The rig mutation relocates one
//! existing hazard onto a target cell; the hazard count never changes.

use serde::{Deserialize, Serialize};

use crate::engine::DrawSource;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    width: u8,
    height: u8,
    /// True marks a hazard
    cells: Vec<bool>,
}

impl Board {
    /// Generate a board with exactly `hazard_count` hazards.
    pub fn generate(
        draws: &mut dyn DrawSource,
        width: u8,
        height: u8,
        hazard_count: u16,
    ) -> Result<Self> {
        let n = width as usize * height as usize;
        if width < 2 || height < 2 {
            return Err(Error::InvalidInput("board must be at least 2x2".to_string()));
        }
        if hazard_count == 0 || hazard_count as usize >= n {
            return Err(Error::InvalidInput(format!(
                "hazard count must be in 1..{}",
                n
            )));
        }

        // Sample whichever side is smaller; the complement is implied.
        let hazard_side = (hazard_count as usize) <= n / 2;
        let sample_count = if hazard_side {
            hazard_count as usize
        } else {
            n - hazard_count as usize
        };

        let mut sampled = vec![false; n];
        let mut placed = 0;
        while placed < sample_count {
            let ix = draws.draw_index(n);
            if !sampled[ix] {
                sampled[ix] = true;
                placed += 1;
            }
        }

        let cells = if hazard_side {
            sampled
        } else {
            sampled.iter().map(|s| !s).collect()
        };

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn hazard_count(&self) -> usize {
        self.cells.iter().filter(|&&h| h).count()
    }

    pub fn safe_count(&self) -> usize {
        self.cell_count() - self.hazard_count()
    }

    pub fn contains(&self, cell: u16) -> bool {
        (cell as usize) < self.cells.len()
    }

    pub fn is_hazard(&self, cell: u16) -> bool {
        self.cells.get(cell as usize).copied().unwrap_or(false)
    }

    /// Relocate one existing hazard onto `target`, marking its former
    /// position safe. The caller guarantees `target` is currently safe;
    /// total hazard count is invariant across the call.
    pub fn relocate_hazard(&mut self, draws: &mut dyn DrawSource, target: u16) -> Result<u16> {
        if !self.contains(target) {
            return Err(Error::InvalidCell(format!("cell {} off board", target)));
        }
        if self.is_hazard(target) {
            return Err(Error::InvalidCell(format!(
                "cell {} is already a hazard",
                target
            )));
        }

        let n = self.cells.len();
        let moved = loop {
            let ix = draws.draw_index(n);
            if self.cells[ix] {
                break ix as u16;
            }
        };

        self.cells[moved as usize] = false;
        self.cells[target as usize] = true;
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SeededDraws;

    #[test]
    fn test_generate_exact_hazard_count() {
        let mut draws = SeededDraws::new(5);
        for &count in &[1u16, 3, 12, 20, 24] {
            let board = Board::generate(&mut draws, 5, 5, count).unwrap();
            assert_eq!(board.hazard_count(), count as usize);
            assert_eq!(board.cell_count(), 25);
        }
    }

    #[test]
    fn test_generate_rejects_degenerate_boards() {
        let mut draws = SeededDraws::new(5);
        assert!(Board::generate(&mut draws, 1, 5, 1).is_err());
        assert!(Board::generate(&mut draws, 5, 5, 0).is_err());
        assert!(Board::generate(&mut draws, 5, 5, 25).is_err());
    }

    #[test]
    fn test_relocate_preserves_hazard_count() {
        let mut draws = SeededDraws::new(8);
        let mut board = Board::generate(&mut draws, 5, 5, 5).unwrap();
        let target = (0..25u16).find(|&c| !board.is_hazard(c)).unwrap();
        let before = board.hazard_count();
        let moved = board.relocate_hazard(&mut draws, target).unwrap();
        assert_eq!(board.hazard_count(), before);
        assert!(board.is_hazard(target));
        assert!(!board.is_hazard(moved));
    }

    #[test]
    fn test_relocate_rejects_hazard_target() {
        let mut draws = SeededDraws::new(8);
        let mut board = Board::generate(&mut draws, 5, 5, 5).unwrap();
        let hazard = (0..25u16).find(|&c| board.is_hazard(c)).unwrap();
        assert!(board.relocate_hazard(&mut draws, hazard).is_err());
    }
}

use super::Body;
use crate::cell::CellId;
use crate::metrics::GrowthStats;
use crate::rng::random_division_params;
use rand::Rng;

impl Body {
    /// Divide randomly chosen live cells with random parameters.
    ///
    /// Cells smaller than `min_division_size` are never picked; growth stops
    /// early when no cell is large enough.
    pub fn grow<R: Rng>(&mut self, rng: &mut R, divisions: usize) -> GrowthStats {
        let mut stats = GrowthStats::default();
        let min_size = self.config.min_division_size;
        for _ in 0..divisions {
            let candidates: Vec<CellId> = self
                .live_cells()
                .filter(|(_, c)| c.size() >= min_size && c.size() > 0.0)
                .map(|(id, _)| id)
                .collect();
            if candidates.is_empty() {
                log::debug!("growth stopped: no cell reaches size {min_size}");
                break;
            }
            let parent = candidates[rng.random_range(0..candidates.len())];
            let params = random_division_params(rng);
            let division = self.divide_with_report(parent, &params);
            stats.divisions += 1;
            stats.resolver_rounds += division.resolve.rounds;
            stats.displaced_cells += division.resolve.affected.len();
            if !division.resolve.converged {
                stats.capped_resolves += 1;
            }
        }
        stats
    }
}

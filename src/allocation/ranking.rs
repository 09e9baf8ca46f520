//! Size Ranking

use smallvec::SmallVec;

use crate::profiles::Size;

/// A size together with its profit density.
#[derive(Debug, Clone, Copy)]
pub struct RankedSize<'a> {
    /// The ranked size
    pub size: &'a Size,

    /// Profit per unit after material cost
    pub net_margin: f64,

    /// Net margin per metre of material
    pub ratio: f64,
}

/// Eligible sizes in production priority order, highest profit density first.
#[derive(Debug, Clone, Default)]
pub struct Ranking<'a> {
    entries: SmallVec<[RankedSize<'a>; 8]>,
}

impl<'a> Ranking<'a> {
    /// Rank sizes by net margin per metre, descending.
    ///
    /// The sort is stable, so sizes with equal ratios keep their input order.
    pub fn new(sizes: &[&'a Size], cost_per_metre: f64) -> Self {
        let mut entries: SmallVec<[RankedSize<'a>; 8]> = sizes
            .iter()
            .map(|&size| RankedSize {
                size,
                net_margin: size.parameters().net_margin(cost_per_metre),
                ratio: size.parameters().ratio(cost_per_metre),
            })
            .collect();

        entries.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));

        Self { entries }
    }

    /// Ranked sizes, best first
    pub fn iter(&self) -> impl Iterator<Item = &RankedSize<'a>> {
        self.entries.iter()
    }

    /// Ranked size at the given priority position
    pub fn get(&self, index: usize) -> Option<&RankedSize<'a>> {
        self.entries.get(index)
    }

    /// Number of ranked sizes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no sizes are ranked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size identifiers in priority order
    pub fn ids(&self) -> SmallVec<[&'a str; 8]> {
        self.entries.iter().map(|ranked| ranked.size.id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::profiles::MaterialProfile;

    use super::*;

    fn ranking_for(profile: &MaterialProfile) -> Ranking<'_> {
        let sizes: SmallVec<[&Size; 8]> = profile.sizes().iter().collect();

        Ranking::new(&sizes, profile.cost_per_metre())
    }

    #[test]
    fn ranks_by_profit_density_descending() -> TestResult {
        let mut profile = MaterialProfile::new("Cotton", 0.0)?;
        profile
            .add_size("B", 3.0, 40.0)?
            .add_size("A", 2.0, 30.0)?
            .add_size("C", 1.0, 5.0)?;

        let ranking = ranking_for(&profile);

        // A: 15/m, B: 13.33/m, C: 5/m
        assert_eq!(ranking.ids().as_slice(), ["A", "B", "C"]);

        Ok(())
    }

    #[test]
    fn material_cost_is_subtracted_before_ranking() -> TestResult {
        let mut profile = MaterialProfile::new("Wool", 10.0)?;
        profile
            .add_size("Long", 4.0, 60.0)?
            .add_size("Short", 1.0, 18.0)?;

        let ranking = ranking_for(&profile);
        let best = ranking.get(0).ok_or("ranking is empty")?;

        // Long: (60 - 40) / 4 = 5/m, Short: (18 - 10) / 1 = 8/m
        assert_eq!(best.size.id(), "Short");
        assert!((best.net_margin - 8.0).abs() < 1e-9);
        assert!((best.ratio - 8.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn equal_ratios_keep_declaration_order() -> TestResult {
        let mut profile = MaterialProfile::new("Cotton", 1.0)?;
        profile
            .add_size("M", 2.0, 10.0)?
            .add_size("S", 1.0, 5.0)?
            .add_size("L", 4.0, 20.0)?;

        let ranking = ranking_for(&profile);

        assert_eq!(ranking.ids().as_slice(), ["M", "S", "L"]);

        Ok(())
    }

    #[test]
    fn negative_margins_rank_last() -> TestResult {
        let mut profile = MaterialProfile::new("Silk", 20.0)?;
        profile
            .add_size("Loss", 1.0, 5.0)?
            .add_size("Gain", 1.0, 25.0)?;

        let ranking = ranking_for(&profile);

        assert_eq!(ranking.ids().as_slice(), ["Gain", "Loss"]);
        assert_eq!(ranking.len(), 2);

        Ok(())
    }
}

//! Model complexity rating

use serde::Serialize;

/// A 1 to 5 complexity score and the drivers that raised it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexityRating {
    pub score: u8,
    /// Triggered drivers joined with `, `; empty for the baseline score
    pub rationale: String,
}

/// Rate a model from its sheet count and graph size
pub fn rate(sheet_count: usize, node_count: usize, edge_count: usize) -> ComplexityRating {
    let mut score: u8 = 1;
    let mut rationale = Vec::new();

    if sheet_count > 30 {
        score += 2;
        rationale.push("High Sheet Count (>30)");
    } else if sheet_count > 10 {
        score += 1;
        rationale.push("Moderate Sheet Count (>10)");
    }

    if node_count > 10_000 {
        score += 2;
        rationale.push("Massive Calculation Graph (>10k nodes)");
    } else if node_count > 2_000 {
        score += 1;
        rationale.push("High Calculation Density");
    }

    if node_count > 0 && edge_count as f64 > node_count as f64 * 1.5 {
        score += 1;
        rationale.push("High Inter-dependency Ratio");
    }

    ComplexityRating {
        score: score.min(5),
        rationale: rationale.join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_baseline() {
        assert_eq!(
            rate(1, 10, 5),
            ComplexityRating {
                score: 1,
                rationale: String::new()
            }
        );
        assert_eq!(rate(0, 0, 0).score, 1);
    }

    #[test]
    fn test_moderate() {
        let rating = rate(11, 2_001, 100);
        assert_eq!(rating.score, 3);
        assert_eq!(
            rating.rationale,
            "Moderate Sheet Count (>10), High Calculation Density"
        );
    }

    #[test]
    fn test_capped_at_five() {
        let rating = rate(31, 10_001, 20_000);
        assert_eq!(rating.score, 5);
        assert_eq!(
            rating.rationale,
            "High Sheet Count (>30), Massive Calculation Graph (>10k nodes), High Inter-dependency Ratio"
        );
    }

    #[test]
    fn test_density_boundary() {
        assert_eq!(rate(1, 10, 15).score, 1);
        assert_eq!(rate(1, 10, 16).score, 2);
    }
}

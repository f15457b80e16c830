//! Side-by-side product battlecards.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::entities::ComparisonRow;

const MISSING_VALUE: &str = "--";

/// Models offered for comparison: own products first, then competitors.
pub fn available_models(
    our_products: &[ComparisonRow],
    competitors: &[ComparisonRow],
    include_competitors: bool,
) -> Vec<String> {
    let mut models = unique_models(our_products);
    if include_competitors {
        models.extend(unique_models(competitors));
    }
    models
}

fn unique_models(rows: &[ComparisonRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| seen.insert(row.model.as_str()))
        .map(|row| row.model.clone())
        .collect()
}

pub fn default_selection(models: &[String]) -> Vec<String> {
    models.iter().take(2).cloned().collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonLine {
    pub parameter: String,
    /// One cell per selected model, in selection order.
    pub values: Vec<String>,
    pub differs: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonSection {
    pub category: String,
    pub lines: Vec<ComparisonLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub models: Vec<String>,
    pub sections: Vec<ComparisonSection>,
}

impl ComparisonTable {
    /// Pivots parameter rows into a category/parameter by model grid.
    ///
    /// Rows are sorted by (category, parameter); the first value seen for a
    /// cell wins and absent cells read `--`.
    pub fn build<'a>(
        rows: impl IntoIterator<Item = &'a ComparisonRow>,
        selected: &[String],
    ) -> Self {
        let mut grid: BTreeMap<(String, String), Vec<Option<String>>> = BTreeMap::new();
        for row in rows {
            let Some(column) = selected.iter().position(|model| *model == row.model) else {
                continue;
            };
            let cells = grid
                .entry((row.primary_category.clone(), row.secondary_parameter.clone()))
                .or_insert_with(|| vec![None; selected.len()]);
            if cells[column].is_none() {
                cells[column] = Some(row.value.clone());
            }
        }

        let mut sections: Vec<ComparisonSection> = Vec::new();
        for ((category, parameter), cells) in grid {
            let values: Vec<String> = cells
                .into_iter()
                .map(|cell| cell.unwrap_or_else(|| MISSING_VALUE.to_string()))
                .collect();
            let differs = selected.len() > 1 && values.iter().any(|value| *value != values[0]);
            let line = ComparisonLine {
                parameter,
                values,
                differs,
            };

            match sections.last_mut() {
                Some(section) if section.category == category => section.lines.push(line),
                _ => sections.push(ComparisonSection {
                    category,
                    lines: vec![line],
                }),
            }
        }

        Self {
            models: selected.to_vec(),
            sections,
        }
    }

    pub fn differing_lines(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|section| section.lines.iter())
            .filter(|line| line.differs)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(model: &str, category: &str, parameter: &str, value: &str) -> ComparisonRow {
        ComparisonRow {
            model: model.to_string(),
            primary_category: category.to_string(),
            secondary_parameter: parameter.to_string(),
            value: value.to_string(),
        }
    }

    fn ours() -> Vec<ComparisonRow> {
        vec![
            row("NuvaSpan", "Technical", "Weight", "45 kg"),
            row("NuvaSpan", "Power", "Battery", "LiFePO4"),
            row("NuvaTrack", "Technical", "Weight", "38 kg"),
            row("NuvaTrack", "Power", "Battery", "LiFePO4"),
            row("NuvaTrack", "Technical", "Water use", "None"),
        ]
    }

    fn theirs() -> Vec<ComparisonRow> {
        vec![row("Rival X", "Technical", "Weight", "52 kg")]
    }

    #[test]
    fn competitors_are_hidden_by_default() {
        let models = available_models(&ours(), &theirs(), false);
        assert_eq!(models, ["NuvaSpan", "NuvaTrack"]);
        let models = available_models(&ours(), &theirs(), true);
        assert_eq!(models, ["NuvaSpan", "NuvaTrack", "Rival X"]);
        assert_eq!(default_selection(&models), ["NuvaSpan", "NuvaTrack"]);
    }

    #[test]
    fn grid_groups_by_category_and_flags_differences() {
        let selected = vec!["NuvaSpan".to_string(), "NuvaTrack".to_string()];
        let table = ComparisonTable::build(&ours(), &selected);

        let categories: Vec<_> = table.sections.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(categories, ["Power", "Technical"]);

        let power = &table.sections[0].lines[0];
        assert_eq!(power.values, ["LiFePO4", "LiFePO4"]);
        assert!(!power.differs);

        let technical = &table.sections[1];
        let parameters: Vec<_> = technical.lines.iter().map(|l| l.parameter.as_str()).collect();
        assert_eq!(parameters, ["Water use", "Weight"]);
        assert_eq!(technical.lines[0].values, ["--", "None"]);
        assert!(technical.lines[0].differs);
        assert_eq!(table.differing_lines(), 2);
    }

    #[test]
    fn single_model_never_differs() {
        let selected = vec!["NuvaTrack".to_string()];
        let table = ComparisonTable::build(&ours(), &selected);
        assert_eq!(table.differing_lines(), 0);
    }

    #[test]
    fn mixed_sources_pivot_together() {
        let selected = vec!["NuvaSpan".to_string(), "Rival X".to_string()];
        let table = ComparisonTable::build(ours().iter().chain(theirs().iter()), &selected);
        let weight = table.sections[1]
            .lines
            .iter()
            .find(|line| line.parameter == "Weight")
            .unwrap();
        assert_eq!(weight.values, ["45 kg", "52 kg"]);
    }
}

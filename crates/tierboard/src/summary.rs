use std::fmt::Write as _;

use serde::Serialize;
use tierboard_layout::{BoardSnapshot, TierTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierSummary {
    pub tier: usize,
    pub label: String,
    pub rows: Vec<u32>,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub template: String,
    pub tier_count: usize,
    pub columns: u16,
    pub total_rows: u32,
    pub control_row: u32,
    pub item_count: usize,
    pub remaining: usize,
    pub state_hash: String,
    pub tiers: Vec<TierSummary>,
}

impl BoardSummary {
    #[must_use]
    pub fn from_snapshot(snapshot: &BoardSnapshot, template: Option<&TierTemplate>) -> Self {
        let staging = snapshot.tiers.len().saturating_sub(1);
        let tiers = snapshot
            .tiers
            .iter()
            .enumerate()
            .map(|(tier, record)| TierSummary {
                tier,
                label: tier_label(template, tier, tier == staging),
                rows: record.occupied_rows.clone(),
                items: record.items.iter().map(|item| item.title.clone()).collect(),
            })
            .collect();

        Self {
            template: snapshot.template_id.clone(),
            tier_count: snapshot.tier_count,
            columns: snapshot.columns,
            total_rows: snapshot.total_rows,
            control_row: snapshot.control_row,
            item_count: snapshot.item_count(),
            remaining: snapshot.remaining,
            state_hash: format!("{:016x}", snapshot.state_hash()),
            tiers,
        }
    }

    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "template={} tiers={} columns={} rows={} control_row={} items={} remaining={} hash={}",
            self.template,
            self.tier_count,
            self.columns,
            self.total_rows,
            self.control_row,
            self.item_count,
            self.remaining,
            self.state_hash
        );
        for tier in &self.tiers {
            let rows = match (tier.rows.first(), tier.rows.last()) {
                (Some(first), Some(last)) if first != last => format!("{first}-{last}"),
                (Some(first), _) => first.to_string(),
                _ => "-".to_string(),
            };
            let _ = writeln!(
                out,
                "  [{:>2}] {:<20} rows {:<6} {:>3} item(s){}",
                tier.tier,
                tier.label,
                rows,
                tier.items.len(),
                if tier.items.is_empty() {
                    String::new()
                } else {
                    format!(": {}", tier.items.join(", "))
                }
            );
        }
        out
    }
}

fn tier_label(template: Option<&TierTemplate>, tier: usize, is_staging: bool) -> String {
    if is_staging {
        return "staging".to_string();
    }
    match template.and_then(|template| template.style(tier)) {
        Some(style) => match &style.score {
            Some(score) => format!("{} {score}", style.name),
            None => style.name.clone(),
        },
        None => format!("tier {tier}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use tierboard_layout::{ItemId, ItemRecord, PlacementTable, TemplateCatalog};

    #[test]
    fn summary_labels_tiers_from_template() {
        let catalog = TemplateCatalog::default();
        let template = catalog.get("K-POP").expect("built-in");
        let mut table =
            PlacementTable::new(template.tier_count(), template.columns).expect("valid");
        let item = ItemId::new(1).expect("non-zero");
        table.add_to_staging(item).expect("staging is free");
        table.move_item(item, 9, 1).expect("move");
        let mut records = BTreeMap::new();
        records.insert(
            item,
            ItemRecord {
                id: item,
                title: "Hype Boy".into(),
                image_key: None,
            },
        );

        let snapshot = BoardSnapshot::capture("K-POP", &table, &records);
        let summary = BoardSummary::from_snapshot(&snapshot, Some(template));
        assert_eq!(summary.tiers[0].label, "LÉGENDAIRE 10");
        assert_eq!(summary.tiers[1].items, vec!["Hype Boy".to_string()]);
        assert_eq!(summary.tiers[9].label, "staging");
        assert_eq!(summary.item_count, 1);

        let text = summary.render_text();
        assert!(text.starts_with("template=K-POP tiers=10"));
        assert!(text.contains("PARFAIT 9,5"));
        assert!(text.contains(": Hype Boy"));
    }

    #[test]
    fn summary_without_template_uses_indices() {
        let table = PlacementTable::new(3, 6).expect("valid");
        let snapshot = BoardSnapshot::capture("custom", &table, &BTreeMap::new());
        let summary = BoardSummary::from_snapshot(&snapshot, None);
        let labels: Vec<&str> = summary.tiers.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["tier 0", "tier 1", "staging"]);
    }
}

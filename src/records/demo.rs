use crate::util::stable_pair;

use super::record::DataRecord;

const CATEGORIES: [&str; 4] = ["compute", "storage", "network", "analytics"];
const GROUPS: [&str; 3] = ["eu-west", "us-east", "ap-south"];
const TIERS: [&str; 2] = ["standard", "premium"];

/// Deterministic synthetic records for running the viewer without a file.
pub fn demo_records(count: usize) -> Vec<DataRecord> {
    (0..count)
        .map(|index| {
            let id = format!("svc-{index:03}");
            let (jx, jy) = stable_pair(&id);
            let size = 5.0 + ((jx + 1.0) * 0.5).powi(2) * 495.0;
            let category = CATEGORIES[index % CATEGORIES.len()];
            let group = GROUPS[((jy + 1.0) * 0.5 * GROUPS.len() as f32) as usize % GROUPS.len()];
            let tier = TIERS[(index / 3) % TIERS.len()];

            DataRecord::new(format!("{category} {index}"), size.round())
                .with_id(id)
                .with_category(category)
                .with_group(group)
                .with_field("tier", tier)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_records_are_deterministic() {
        assert_eq!(demo_records(8), demo_records(8));
    }

    #[test]
    fn demo_records_have_unique_ids_and_valid_sizes() {
        let records = demo_records(40);
        let mut ids = records
            .iter()
            .filter_map(|record| record.id.clone())
            .collect::<Vec<_>>();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 40);
        assert!(records.iter().all(|record| record.size >= 5.0 && record.size <= 500.0));
        assert!(records.iter().all(|record| record.group.is_some()));
    }
}

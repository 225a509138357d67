use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::filters::ShiftFilter;
use crate::models::resource::Resource;
use crate::models::shift::{ShiftDefinition, ShiftPeriod};

/// Shift definitions that govern `resource` on `date`, morning first.
///
/// For each period a date-specific definition beats the recurring one. Ties
/// between definitions of the same kind go to the earliest start so the
/// result does not depend on storage order.
pub fn resolve(
    resource: &Resource,
    date: NaiveDate,
    definitions: &[ShiftDefinition],
) -> Vec<ShiftDefinition> {
    if !resource.is_active {
        return Vec::new();
    }

    let filter = ShiftFilter::for_date(resource.id, date);
    let mut chosen: BTreeMap<ShiftPeriod, &ShiftDefinition> = BTreeMap::new();

    for def in definitions.iter().filter(|d| filter.matches(d)) {
        let replace = match chosen.get(&def.shift_period) {
            None => true,
            Some(current) => match (current.is_date_specific(), def.is_date_specific()) {
                (false, true) => true,
                (true, false) => false,
                _ => (def.start_time, def.id) < (current.start_time, current.id),
            },
        };
        if replace {
            chosen.insert(def.shift_period, def);
        }
    }

    chosen.into_values().cloned().collect()
}

use crate::grid::{Classification, RateRow};

/// Cells without a value stay `Unset`; a row without a baseline value is
/// left entirely unclassified.
pub fn classify(row: &RateRow, k: usize) -> RateRow {
    let mut out = row.clone();
    for cell in &mut out.cells {
        cell.classification = Classification::Unset;
    }

    let Some(baseline) = out.cells.first().and_then(|c| c.value) else {
        return out;
    };
    out.cells[0].classification = Classification::Baseline;

    // (value, cell index); at most k entries.
    let mut candidates: Vec<(i64, usize)> =
        Vec::with_capacity(k.min(out.cells.len().saturating_sub(1)));
    for (idx, cell) in out.cells.iter_mut().enumerate().skip(1) {
        let Some(value) = cell.value else {
            continue;
        };
        if value < baseline {
            cell.classification = Classification::BelowBaseline;
            continue;
        }
        cell.classification = Classification::Normal;
        offer(&mut candidates, k, value, idx);
    }

    for (_, idx) in candidates {
        out.cells[idx].classification = Classification::TopK;
    }
    out
}

// A full set only admits a strictly smaller value and evicts the last-seen
// of its largest entries, so earlier cells win ties.
fn offer(candidates: &mut Vec<(i64, usize)>, k: usize, value: i64, idx: usize) {
    if k == 0 {
        return;
    }
    if candidates.len() < k {
        candidates.push((value, idx));
        return;
    }
    let Some((worst_pos, &(worst_value, _))) = candidates
        .iter()
        .enumerate()
        .max_by_key(|(_, (v, i))| (*v, *i))
    else {
        return;
    };
    if value < worst_value {
        candidates[worst_pos] = (value, idx);
    }
}

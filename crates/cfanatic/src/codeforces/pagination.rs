use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One size-bounded slice of the problemset listing.
///
/// `next_start_index` is the cursor for the following page and is `None` on the
/// last one. Cursors only line up with a listing fetched with the same tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemPage {
    pub problems: Vec<Value>,
    #[serde(rename = "problemStatistics")]
    pub problem_statistics: Vec<Value>,
    pub next_start_index: Option<usize>,
    pub total_problems: usize,
}

/// Cut a page out of the full `(problems, problemStatistics)` pair, starting at
/// `start_index` and stopping before the accumulated serialized size would
/// exceed `limit_kb` kilobytes.
///
/// A non-empty range always yields at least one problem, even when that single
/// problem is larger than the limit.
pub fn paginate(
    problems: Vec<Value>,
    statistics: Vec<Value>,
    start_index: usize,
    limit_kb: usize,
) -> ProblemPage {
    let total_problems = problems.len();
    if start_index >= total_problems {
        return ProblemPage {
            problems: Vec::new(),
            problem_statistics: Vec::new(),
            next_start_index: None,
            total_problems,
        };
    }

    let limit_bytes = limit_kb.saturating_mul(1024);
    let mut current_size = 0usize;
    let mut next_start_index = None;
    let mut end = total_problems;

    for (i, problem) in problems.iter().enumerate().skip(start_index) {
        let item_size = estimate_size(problem) + statistics.get(i).map_or(2, estimate_size);

        if current_size + item_size > limit_bytes && i > start_index {
            next_start_index = Some(i);
            end = i;
            break;
        }
        current_size += item_size;
    }

    let mut problem_statistics: Vec<Value> = statistics
        .into_iter()
        .skip(start_index)
        .take(end - start_index)
        .collect();
    // Missing statistics are padded so both arrays stay aligned
    problem_statistics.resize(end - start_index, json!({}));

    ProblemPage {
        problems: problems
            .into_iter()
            .skip(start_index)
            .take(end - start_index)
            .collect(),
        problem_statistics,
        next_start_index,
        total_problems,
    }
}

fn estimate_size(value: &Value) -> usize {
    value.to_string().len()
}

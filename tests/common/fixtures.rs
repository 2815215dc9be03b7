use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Fresh shared visit list for [`RecordVisit`](super::RecordVisit)
/// handlers.
pub fn visit_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Builds an initial state map from key/value pairs.
pub fn state_map(pairs: &[(&str, Value)]) -> FxHashMap<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Python-flavored sample input for the code-review handlers.
pub const SAMPLE_CODE_WITH_ISSUES: &str = r#"
def risky_function(code):
    try:
        result = eval(code)
    except:
        result = None
    return result

def VeryLongLineFunctionThatDoesNotFollowPep8NamingConventions(parameter1, parameter2, parameter3):
    return parameter1 + parameter2 + parameter3
"#;

pub const SAMPLE_CODE_SIMPLE: &str = r#"
def calculate_sum(a, b):
    return a + b

def calculate_product(a, b):
    return a * b
"#;

pub const SAMPLE_CODE_COMPLEX: &str = r#"
def process_data(data):
    result = []
    for item in data:
        if item > 0:
            if item % 2 == 0:
                result.append(item * 2)
            else:
                result.append(item + 1)
        elif item < 0:
            result.append(abs(item))
    return result

def ComplexFunction(x, y, z):
    if x > 0 and y > 0:
        if z > 0:
            return x + y + z
        else:
            return x + y - z
    elif x < 0 or y < 0:
        return 0
    return -1
"#;

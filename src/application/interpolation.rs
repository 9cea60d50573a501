// Placeholder expansion for template strings
use serde_json::{Map, Value};

/// Flat variable context; values may be structured and addressed by path
pub type Context = Map<String, Value>;

/// Replace `${name}` placeholders with values from `context`.
///
/// `name` is either a key of the context or a dotted path into it
/// (`${forecast_metrics.0.metric_name}`). Placeholders that do not resolve,
/// or resolve to null, are kept verbatim.
pub fn expand(template: &str, context: &Context) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let body = &rest[start + 2..];

        let Some(end) = body.find('}') else {
            // unterminated, nothing more to expand
            result.push_str(&rest[start..]);
            return result;
        };

        let placeholder = &rest[start..start + 2 + end + 1];
        match lookup(context, body[..end].trim()) {
            Some(value) => result.push_str(&render(value)),
            None => result.push_str(placeholder),
        }
        rest = &body[end + 1..];
    }

    result.push_str(rest);
    result
}

/// Expand a string value in place; other value types are left alone
pub fn expand_value(value: &mut Value, context: &Context) {
    if let Value::String(s) = value {
        *s = expand(s, context);
    }
}

fn lookup<'a>(context: &'a Context, name: &str) -> Option<&'a Value> {
    if let Some(value) = context.get(name) {
        return non_null(value);
    }

    let mut parts = name.split('.');
    let mut current = context.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    non_null(current)
}

fn non_null(value: &Value) -> Option<&Value> {
    (!value.is_null()).then_some(value)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! Filter matching, update expressions, and insert normalization.
//!
//! The matcher is intentionally small: top-level field equality only.
//! Update expressions support `$set`, `$inc`, and `$unset`; a document
//! without operators is a full replacement that preserves `_id`.

use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use scribe_core::{Document, DocumentId, StoreError, StoreResult, ID_FIELD};

/// Canonical map key for a document identifier.
pub fn id_key(id: &DocumentId) -> String {
    id.to_string()
}

/// Reject filters that are not plain equality documents.
pub fn validate_filter(filter: &Document) -> StoreResult<()> {
    let obj = filter
        .as_object()
        .ok_or_else(|| StoreError::BadValue(format!("filter must be an object, got {filter}")))?;
    if let Some(op) = obj.keys().find(|k| k.starts_with('$')) {
        return Err(StoreError::BadValue(format!(
            "unsupported query operator: {op}"
        )));
    }
    Ok(())
}

/// True when every filter field equals the corresponding document field.
/// An empty filter matches every document.
pub fn matches(doc: &Document, filter: &Document) -> bool {
    match filter.as_object() {
        Some(obj) => obj.iter().all(|(field, value)| doc.get(field) == Some(value)),
        None => false,
    }
}

/// Normalize a document for insertion.
///
/// A missing `_id` is assigned a generated UUID string; an `_id` of array
/// or object type is rejected, as are `$`-prefixed field names.
pub fn fix_document_for_insert(doc: &Document) -> StoreResult<Document> {
    let obj = doc
        .as_object()
        .ok_or_else(|| StoreError::BadValue(format!("document must be an object, got {doc}")))?;
    if let Some(field) = obj.keys().find(|k| k.starts_with('$')) {
        return Err(StoreError::BadValue(format!(
            "field name {field} cannot start with '$'"
        )));
    }
    match obj.get(ID_FIELD) {
        Some(JsonValue::Array(_)) | Some(JsonValue::Object(_)) => {
            return Err(StoreError::BadValue(format!(
                "document {ID_FIELD} must be a scalar value"
            )))
        }
        Some(_) => Ok(doc.clone()),
        None => {
            let mut fixed = obj.clone();
            fixed.insert(
                ID_FIELD.to_string(),
                json!(Uuid::new_v4().to_string()),
            );
            Ok(JsonValue::Object(fixed))
        }
    }
}

/// Classify an update expression: all-operator or full replacement.
/// Mixing operator and plain fields is rejected.
fn is_operator_update(update: &Document) -> StoreResult<bool> {
    let obj = update.as_object().ok_or_else(|| {
        StoreError::BadValue(format!("update expression must be an object, got {update}"))
    })?;
    let operators = obj.keys().filter(|k| k.starts_with('$')).count();
    if operators == 0 {
        Ok(false)
    } else if operators == obj.len() {
        Ok(true)
    } else {
        Err(StoreError::BadValue(
            "cannot mix operator and non-operator fields in an update".to_string(),
        ))
    }
}

/// Apply an update expression in place. Returns whether the document
/// actually changed.
pub fn apply_update(doc: &mut Document, update: &Document) -> StoreResult<bool> {
    if is_operator_update(update)? {
        apply_operators(doc, update)
    } else {
        let mut replacement = update.clone();
        let old_id = doc.get(ID_FIELD).cloned();
        if let Some(old_id) = old_id {
            match replacement.get(ID_FIELD) {
                Some(new_id) if *new_id != old_id => {
                    return Err(StoreError::BadValue(format!(
                        "the {ID_FIELD} field cannot be changed"
                    )))
                }
                Some(_) => {}
                None => {
                    if let Some(obj) = replacement.as_object_mut() {
                        obj.insert(ID_FIELD.to_string(), old_id);
                    }
                }
            }
        }
        if replacement.as_object().is_none() {
            return Err(StoreError::BadValue(format!(
                "replacement document must be an object, got {replacement}"
            )));
        }
        let changed = replacement != *doc;
        *doc = replacement;
        Ok(changed)
    }
}

fn apply_operators(doc: &mut Document, update: &Document) -> StoreResult<bool> {
    let mut changed = false;
    let update_obj = update.as_object().ok_or_else(|| {
        StoreError::BadValue("update expression must be an object".to_string())
    })?;
    for (op, args) in update_obj {
        let args = args.as_object().ok_or_else(|| {
            StoreError::BadValue(format!("{op} arguments must be an object, got {args}"))
        })?;
        let fields = doc.as_object_mut().ok_or_else(|| {
            StoreError::Internal("stored document is not an object".to_string())
        })?;
        match op.as_str() {
            "$set" => {
                for (field, value) in args {
                    if field == ID_FIELD
                        && fields.get(ID_FIELD).is_some_and(|cur| cur != value)
                    {
                        return Err(StoreError::BadValue(format!(
                            "the {ID_FIELD} field cannot be changed"
                        )));
                    }
                    if fields.get(field) != Some(value) {
                        fields.insert(field.clone(), value.clone());
                        changed = true;
                    }
                }
            }
            "$inc" => {
                for (field, delta) in args {
                    let delta = delta.as_f64().ok_or_else(|| {
                        StoreError::BadValue(format!(
                            "$inc amount for {field} must be numeric, got {delta}"
                        ))
                    })?;
                    let next = match fields.get(field) {
                        None => json!(delta),
                        Some(JsonValue::Number(n)) => {
                            // Stay integral when both sides are integral.
                            match (n.as_i64(), integral(delta)) {
                                (Some(base), Some(step)) => match base.checked_add(step) {
                                    Some(sum) => json!(sum),
                                    None => json!(base as f64 + step as f64),
                                },
                                _ => json!(n.as_f64().unwrap_or(0.0) + delta),
                            }
                        }
                        Some(other) => {
                            return Err(StoreError::BadValue(format!(
                                "cannot apply $inc to non-numeric field {field}: {other}"
                            )))
                        }
                    };
                    fields.insert(field.clone(), next);
                    changed = true;
                }
            }
            "$unset" => {
                for field in args.keys() {
                    if fields.remove(field).is_some() {
                        changed = true;
                    }
                }
            }
            other => {
                return Err(StoreError::BadValue(format!(
                    "unknown update operator: {other}"
                )))
            }
        }
    }
    Ok(changed)
}

fn integral(v: f64) -> Option<i64> {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

/// Build the document an upsert inserts when the filter matched nothing.
///
/// Operator updates start from the filter's equality fields; replacement
/// updates are taken as-is (inheriting the filter's `_id` when they carry
/// none). The result is normalized for insert, which assigns a generated
/// `_id` if needed.
pub fn build_upsert_document(filter: &Document, update: &Document) -> StoreResult<Document> {
    let base = if is_operator_update(update)? {
        let mut seed = serde_json::Map::new();
        if let Some(obj) = filter.as_object() {
            for (field, value) in obj {
                if !field.starts_with('$') {
                    seed.insert(field.clone(), value.clone());
                }
            }
        }
        let mut base = JsonValue::Object(seed);
        apply_operators(&mut base, update)?;
        base
    } else {
        let mut base = update.clone();
        if base.get(ID_FIELD).is_none() {
            if let (Some(obj), Some(id)) = (base.as_object_mut(), filter.get(ID_FIELD)) {
                obj.insert(ID_FIELD.to_string(), id.clone());
            }
        }
        base
    };
    fix_document_for_insert(&base)
}

//! Parameter maps for `setParameters` / `setParameter`.
//!
//! Keys always follow the statement's placeholder inventory: positional
//! values land on `param1..paramN` by position, never by the order the
//! array literal happens to list them in.

use crate::ast::{ArrayItem, Expr};
use crate::error::TranslateError;
use crate::normalizer::{Placeholders, positional_name};

/// Builder parameter name to source expression, in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterMap {
    entries: Vec<(String, Expr)>,
}

impl ParameterMap {
    /// Build the map from an `execute(...)` argument list.
    ///
    /// No argument means no parameters. More than one argument, or an
    /// argument that is not an array literal, cannot be mapped.
    pub fn from_execute_args(
        args: &[Expr],
        placeholders: &Placeholders,
    ) -> Result<Self, TranslateError> {
        match args {
            [] => Ok(Self::default()),
            [Expr::Array(items)] => Self::from_items(items, placeholders),
            [_] => Err(TranslateError::UnsupportedCall(
                "execute argument is not an array literal".to_string(),
            )),
            _ => Err(TranslateError::UnsupportedCall(
                "execute takes a single parameter array".to_string(),
            )),
        }
    }

    fn from_items(items: &[ArrayItem], placeholders: &Placeholders) -> Result<Self, TranslateError> {
        if items.len() != placeholders.len() {
            return Err(TranslateError::mismatch(format!(
                "{} values for {} placeholders",
                items.len(),
                placeholders.len()
            )));
        }

        match placeholders {
            Placeholders::None => Ok(Self::default()),
            Placeholders::Positional(n) => {
                let mut slots: Vec<Option<Expr>> = vec![None; *n];
                for (position, item) in items.iter().enumerate() {
                    let index = match &item.key {
                        None => position,
                        Some(Expr::Int(k)) => usize::try_from(*k)
                            .map_err(|_| TranslateError::mismatch(format!("negative key {}", k)))?,
                        Some(_) => {
                            return Err(TranslateError::mismatch(
                                "keyed values for positional placeholders",
                            ));
                        }
                    };
                    let slot = slots.get_mut(index).ok_or_else(|| {
                        TranslateError::mismatch(format!("no placeholder at position {}", index))
                    })?;
                    if slot.replace(item.value.clone()).is_some() {
                        return Err(TranslateError::mismatch(format!(
                            "position {} bound twice",
                            index
                        )));
                    }
                }
                let entries = slots
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| {
                        value
                            .map(|v| (positional_name(i + 1), v))
                            .ok_or_else(|| TranslateError::mismatch(format!("position {} unbound", i)))
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Self { entries })
            }
            Placeholders::Named(names) => {
                let mut entries = Vec::with_capacity(names.len());
                for name in names {
                    let value = items
                        .iter()
                        .find(|item| matches!(&item.key, Some(Expr::Str(k)) if strip_colon(k) == name))
                        .ok_or_else(|| TranslateError::mismatch(format!("no value for :{}", name)))?;
                    entries.push((name.clone(), value.value.clone()));
                }
                Ok(Self { entries })
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(String, Expr)] {
        &self.entries
    }

    /// The keyed array literal passed to `setParameters`.
    pub fn to_expr(&self) -> Expr {
        Expr::map(
            self.entries
                .iter()
                .map(|(k, v)| (k.as_str(), v.clone()))
                .collect(),
        )
    }
}

fn strip_colon(key: &str) -> &str {
    key.strip_prefix(':').unwrap_or(key)
}

/// Map a `bindValue` key onto a builder parameter name.
///
/// `1` becomes `param1`; `":name"` and `"name"` become `name`. The name
/// must exist in the statement's inventory.
pub fn bind_key(key: &Expr, placeholders: &Placeholders) -> Result<String, TranslateError> {
    let name = match (key, placeholders) {
        (Expr::Int(k), Placeholders::Positional(_)) if *k >= 1 => positional_name(*k as usize),
        (Expr::Str(k), Placeholders::Named(_)) => strip_colon(k).to_string(),
        _ => {
            return Err(TranslateError::mismatch(
                "bind key does not match the statement's placeholders",
            ));
        }
    };
    if placeholders.contains(&name) {
        Ok(name)
    } else {
        Err(TranslateError::mismatch(format!("unknown parameter '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keyed(entries: Vec<(Expr, Expr)>) -> Expr {
        Expr::Array(
            entries
                .into_iter()
                .map(|(k, value)| ArrayItem {
                    key: Some(k),
                    value,
                })
                .collect(),
        )
    }

    #[test]
    fn test_positional_list() {
        let map = ParameterMap::from_execute_args(
            &[Expr::list(vec![Expr::Int(25), Expr::str("John")])],
            &Placeholders::Positional(2),
        )
        .unwrap();
        assert_eq!(
            map.entries(),
            &[
                ("param1".to_string(), Expr::Int(25)),
                ("param2".to_string(), Expr::str("John")),
            ]
        );
    }

    #[test]
    fn test_positional_keys_follow_position_not_listing_order() {
        let map = ParameterMap::from_execute_args(
            &[keyed(vec![
                (Expr::Int(1), Expr::str("second")),
                (Expr::Int(0), Expr::str("first")),
            ])],
            &Placeholders::Positional(2),
        )
        .unwrap();
        assert_eq!(map.entries()[0], ("param1".to_string(), Expr::str("first")));
        assert_eq!(map.entries()[1], ("param2".to_string(), Expr::str("second")));
    }

    #[test]
    fn test_named_keys_with_or_without_colon() {
        let placeholders = Placeholders::Named(vec!["id".to_string(), "role".to_string()]);
        let map = ParameterMap::from_execute_args(
            &[keyed(vec![
                (Expr::str("role"), Expr::str("admin")),
                (Expr::str(":id"), Expr::var("id")),
            ])],
            &placeholders,
        )
        .unwrap();
        assert_eq!(
            map.to_expr(),
            Expr::map(vec![("id", Expr::var("id")), ("role", Expr::str("admin"))])
        );
    }

    #[test]
    fn test_mismatches() {
        let two = Placeholders::Positional(2);
        assert!(matches!(
            ParameterMap::from_execute_args(&[Expr::list(vec![Expr::Int(1)])], &two),
            Err(TranslateError::ParameterMismatch(_))
        ));
        assert!(matches!(
            ParameterMap::from_execute_args(&[Expr::var("params")], &two),
            Err(TranslateError::UnsupportedCall(_))
        ));
        assert!(
            ParameterMap::from_execute_args(
                &[keyed(vec![
                    (Expr::Int(0), Expr::Int(1)),
                    (Expr::Int(0), Expr::Int(2)),
                ])],
                &two
            )
            .is_err()
        );

        let named = Placeholders::Named(vec!["id".to_string()]);
        assert!(
            ParameterMap::from_execute_args(&[keyed(vec![(Expr::str("other"), Expr::Int(1))])], &named)
                .is_err()
        );
    }

    #[test]
    fn test_no_arguments() {
        let map = ParameterMap::from_execute_args(&[], &Placeholders::None).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_bind_key() {
        let positional = Placeholders::Positional(2);
        assert_eq!(bind_key(&Expr::Int(2), &positional).unwrap(), "param2");
        assert!(bind_key(&Expr::Int(3), &positional).is_err());
        assert!(bind_key(&Expr::Int(0), &positional).is_err());

        let named = Placeholders::Named(vec!["email".to_string()]);
        assert_eq!(bind_key(&Expr::str(":email"), &named).unwrap(), "email");
        assert_eq!(bind_key(&Expr::str("email"), &named).unwrap(), "email");
        assert!(bind_key(&Expr::str(":nope"), &named).is_err());
        assert!(bind_key(&Expr::Int(1), &named).is_err());
    }
}

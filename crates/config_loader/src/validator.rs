//! 配置校验模块
//!
//! 校验规则：
//! - window_ms > 0, max_per_window >= 1 (字段级, validator derive)
//! - timeout_ms > 0, channel_capacity >= 1
//! - http 传输必须使用 http/https URL
//! - content_type 非空

use contracts::{ContractError, DispatcherBlueprint, TransportKind};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 DispatcherBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &DispatcherBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_transport(blueprint)?;
    Ok(())
}

/// 字段级校验 (derive 规则)
fn validate_fields(blueprint: &DispatcherBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_field_error(&errors, "")
            .unwrap_or_else(|| ("blueprint".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// 按字段名排序，取第一个失败字段 (结果稳定)
fn first_field_error(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                if let Some(error) = field_errors.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_field_error(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_field_error(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// 校验传输配置
fn validate_transport(blueprint: &DispatcherBlueprint) -> Result<(), ContractError> {
    let transport = &blueprint.transport;

    if transport.kind == TransportKind::Http
        && !(transport.url.starts_with("http://") || transport.url.starts_with("https://"))
    {
        return Err(ContractError::config_validation(
            "transport.url",
            format!("http transport requires an http(s) url, got '{}'", transport.url),
        ));
    }

    if transport.content_type.trim().is_empty() {
        return Err(ContractError::config_validation(
            "transport.content_type",
            "content_type cannot be empty",
        ));
    }

    Ok(())
}

//! 记录展平
//!
//! 把一条或多条（可能嵌套的）记录投影成一个有序的 属性名 → 值 映射，
//! 叶子就在这个命名空间里查找属性。
//!
//! - 字段以外部名字为键，没有时用自身名字，可选转换为 snake case
//! - 嵌套记录递归展开，键用 `.` 接在父键后面；
//!   移除前缀时只保留最内层名字，后出现的条目覆盖先出现的
//! - 日期时间是终端值；null 字段直接跳过

use std::collections::HashMap;

use crate::config::ValidatorConfig;
use crate::error::{EvalError, Result};
use crate::utils::to_snake_case;
use crate::value::{Record, Value};

/// 扁平的属性命名空间，按首次插入顺序排列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖条目，被覆盖的键保持原来的位置
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = value;
            return;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// 合并另一条记录，键冲突时 `other` 的条目优先
    pub fn extend(&mut self, other: FlatRecord) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }
}

fn exposed_key(name: &str, config: &ValidatorConfig) -> String {
    if config.snake_case_names {
        to_snake_case(name)
    } else {
        name.to_string()
    }
}

fn join(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, key),
        _ => key.to_string(),
    }
}

fn flatten_into(out: &mut FlatRecord, record: &Record, prefix: Option<&str>, config: &ValidatorConfig) {
    for field in &record.fields {
        let key = exposed_key(field.key(), config);
        match &field.value {
            Value::Null => {}
            Value::Record(nested) => {
                if config.remove_prefix {
                    flatten_into(out, nested, None, config);
                } else {
                    let nested_prefix = join(prefix, &key);
                    flatten_into(out, nested, Some(nested_prefix.as_str()), config);
                }
            }
            value => {
                let full_key = if config.remove_prefix {
                    key
                } else {
                    join(prefix, &key)
                };
                out.insert(full_key, value.clone());
            }
        }
    }
}

/// 展平单条记录，记录自身的类型名不作为前缀
pub fn flatten(record: &Record, config: &ValidatorConfig) -> FlatRecord {
    let mut out = FlatRecord::new();
    flatten_into(&mut out, record, None, config);
    out
}

/// 展平一个必须是记录的值
pub fn flatten_value(value: &Value, config: &ValidatorConfig) -> Result<FlatRecord> {
    match value {
        Value::Record(record) => Ok(flatten(record, config)),
        Value::Null => Err(EvalError::InvalidData("record is null".to_string())),
        other => Err(EvalError::InvalidType(format!(
            "expected a record, got {}",
            other.kind_name()
        ))),
    }
}

/// 把多条异构记录展平到同一个命名空间
///
/// 每条记录的键以其类型名为前缀（移除前缀或记录没有类型名时除外），
/// 后面的记录覆盖前面的
pub fn flatten_many(values: &[Value], config: &ValidatorConfig) -> Result<FlatRecord> {
    if values.is_empty() {
        return Err(EvalError::InvalidData("no records to validate".to_string()));
    }

    let mut out = FlatRecord::new();
    for (i, value) in values.iter().enumerate() {
        let record = match value {
            Value::Record(record) => record,
            Value::Null => {
                return Err(EvalError::InvalidData(format!("record #{} is null", i)));
            }
            other => {
                return Err(EvalError::InvalidType(format!(
                    "record #{}: expected a record, got {}",
                    i,
                    other.kind_name()
                )));
            }
        };

        if config.remove_prefix || record.type_name.is_empty() {
            flatten_into(&mut out, record, None, config);
        } else {
            let prefix = exposed_key(&record.type_name, config);
            flatten_into(&mut out, record, Some(prefix.as_str()), config);
        }
    }
    Ok(out)
}

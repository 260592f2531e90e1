//! 运行时值与记录内省
//!
//! 宿主类型通过 [`ToValue`] 把自己描述成 [`Value`] 树，
//! 每个字段的变体就是它的语义类型：整数、浮点数、布尔、文本、日期时间、
//! 嵌套记录或空引用。

use std::fmt;

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::Serialize;

use crate::error::{EvalError, Result};

/// 动态类型的字段值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 空引用（`None`）
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// 终端值，展平时不会递归进入
    DateTime(DateTime<FixedOffset>),
    Record(Record),
    List(Vec<Value>),
}

impl Value {
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// 值类型的名字，用于错误信息
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Text(_) => "text",
            Value::DateTime(_) => "date-time",
            Value::Record(_) => "record",
            Value::List(_) => "list",
        }
    }

    /// 转换任意可被 serde 序列化的宿主值
    ///
    /// 结构体变成以 Rust 类型名命名的记录。
    /// 被序列化成字符串的日期时间在这里是文本
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Value> {
        let json = serde_json::to_value(value)
            .map_err(|e| EvalError::InvalidType(format!("unserializable value: {}", e)))?;
        let converted = Value::from(json);
        Ok(match converted {
            Value::Record(mut record) => {
                record.type_name = short_type_name::<T>().to_string();
                Value::Record(record)
            }
            other => other,
        })
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Record(record) => write!(f, "{}{{..}}", record.type_name),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let mut record = Record::new("");
                for (key, value) in map {
                    record.push(Field::new(key, Value::from(value)));
                }
                Value::Record(record)
            }
        }
    }
}

/// 记录中的一个字段
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// 字段自身（内部）的名字
    pub name: String,
    /// 声明的外部名字，存在时优先于 `name`
    pub external_name: Option<String>,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            external_name: None,
            value,
        }
    }

    pub fn named(name: impl Into<String>, external_name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            external_name: Some(external_name.into()),
            value,
        }
    }

    /// 字段对外暴露的键
    pub fn key(&self) -> &str {
        match &self.external_name {
            Some(external) if !external.is_empty() => external,
            _ => &self.name,
        }
    }
}

/// 结构化记录：类型名加有序的字段列表
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub type_name: String,
    pub fields: Vec<Field>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// 添加以自身名字暴露的字段
    pub fn field(mut self, name: impl Into<String>, value: impl ToValue) -> Self {
        self.fields.push(Field::new(name, value.to_value()));
        self
    }

    /// 添加以外部名字暴露的字段
    pub fn field_named(
        mut self,
        name: impl Into<String>,
        external_name: impl Into<String>,
        value: impl ToValue,
    ) -> Self {
        self.fields
            .push(Field::named(name, external_name, value.to_value()));
        self
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// 按暴露的键查找直接字段
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.key() == key).map(|f| &f.value)
    }
}

/// 把宿主值描述成 [`Value`] 的能力
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

macro_rules! int_to_value {
    ($($t:ty),*) => {
        $(impl ToValue for $t {
            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }
        })*
    };
}

int_to_value!(i8, i16, i32, i64, isize, u8, u16, u32);

// 超出 i64 范围的无符号整数退化为浮点数，不截断
macro_rules! wide_int_to_value {
    ($($t:ty),*) => {
        $(impl ToValue for $t {
            fn to_value(&self) -> Value {
                match i64::try_from(*self) {
                    Ok(n) => Value::Int(n),
                    Err(_) => Value::Float(*self as f64),
                }
            }
        })*
    };
}

wide_int_to_value!(u64, usize, i128, u128);

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl<Tz: TimeZone> ToValue for DateTime<Tz> {
    fn to_value(&self) -> Value {
        Value::DateTime(self.fixed_offset())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for Record {
    fn to_value(&self) -> Value {
        Value::Record(self.clone())
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::from(self.clone())
    }
}

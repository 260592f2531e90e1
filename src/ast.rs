//! 条件树 (Condition Tree) 的定义
//!
//! 查询被编译成一棵由 `Leaf` 和 `Group` 组成的树。连接符 (`&&` / `||`)
//! 挂在子节点上，描述该子节点与前面兄弟节点累积结果之间的关系，
//! 因此求值只需从左到右折叠，没有运算符优先级。

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::TokenKind;
use crate::utils::parse_datetime;

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperatorKind {
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "|=")]
    Contains,
    #[serde(rename = "|~")]
    ContainsRegex,
}

impl OperatorKind {
    /// 从 token 转换，非比较运算符返回 None
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Eq => Some(OperatorKind::Eq),
            TokenKind::NotEq => Some(OperatorKind::NotEq),
            TokenKind::Lt => Some(OperatorKind::Lt),
            TokenKind::Lte => Some(OperatorKind::Lte),
            TokenKind::Gt => Some(OperatorKind::Gt),
            TokenKind::Gte => Some(OperatorKind::Gte),
            TokenKind::Contains => Some(OperatorKind::Contains),
            TokenKind::ContainsRegex => Some(OperatorKind::ContainsRegex),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            OperatorKind::Eq => "=",
            OperatorKind::NotEq => "!=",
            OperatorKind::Lt => "<",
            OperatorKind::Lte => "<=",
            OperatorKind::Gt => ">",
            OperatorKind::Gte => ">=",
            OperatorKind::Contains => "|=",
            OperatorKind::ContainsRegex => "|~",
        }
    }

}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// 逻辑连接符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    /// 把子节点的结果折叠进累积结果
    pub fn fold(self, accumulated: bool, next: bool) -> bool {
        match self {
            Connector::And => accumulated && next,
            Connector::Or => accumulated || next,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Connector::And => "&&",
            Connector::Or => "||",
        }
    }
}

/// 字面量在解析时推断出的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Numeric,
    Date,
    #[default]
    Text,
}

impl ValueType {
    /// 推断未加引号字面量的类型：
    /// 只含数字且最多一个小数点（逗号作为千位分隔符忽略）为 Numeric，
    /// 能按固定日期格式解析的为 Date，其余为 Text。
    /// 引号字面量不经过推断，总是 Text
    pub fn infer(literal: &str) -> Self {
        if is_numeric_literal(literal) {
            ValueType::Numeric
        } else if parse_datetime(literal).is_some() {
            ValueType::Date
        } else {
            ValueType::Text
        }
    }
}

fn is_numeric_literal(literal: &str) -> bool {
    let digits: String = literal.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || digits.starts_with('.') || digits.ends_with('.') {
        return false;
    }
    let mut dots = 0;
    for c in digits.chars() {
        match c {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    dots <= 1
}

/// 单个属性比较，例如 `member_id >= 45`
///
/// `value` 始终保存原始字面量文本，类型化的比较值在求值时按需推导。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub operator: OperatorKind,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl Attribute {
    /// 创建属性并按未加引号字面量推断类型
    pub fn new(name: impl Into<String>, operator: OperatorKind, value: impl Into<String>) -> Self {
        let value = value.into();
        let value_type = ValueType::infer(&value);
        Self {
            name: name.into(),
            operator,
            value,
            value_type,
        }
    }

    /// 没有名字的属性，对任何真实数据求值都为 false
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// 字面量是否需要加引号才能原样解析回来
    fn needs_quotes(&self) -> bool {
        self.value.is_empty()
            || self.value.chars().any(|c| {
                c.is_whitespace() || matches!(c, '(' | ')' | '=' | '~' | '<' | '>' | '&' | '|' | '!')
            })
            || ValueType::infer(&self.value) != self.value_type
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.needs_quotes() {
            write!(f, "{} {} \"{}\"", self.name, self.operator, self.value)
        } else {
            write!(f, "{} {} {}", self.name, self.operator, self.value)
        }
    }
}

/// 条件树节点：叶子或分组，二者必居其一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// 单个属性比较
    Leaf(Attribute),
    /// 按连接符串联的子条件，由括号或查询顶层产生
    Group(Group),
}

/// 非空的子条件序列。第一个子条件没有连接符，是折叠的起点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    head: Box<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tail: Vec<Clause>,
}

/// 带连接符的子条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub connector: Connector,
    pub condition: Condition,
}

impl Group {
    pub fn new(head: Condition) -> Self {
        Self {
            head: Box::new(head),
            tail: Vec::new(),
        }
    }

    pub fn push(&mut self, connector: Connector, condition: Condition) {
        self.tail.push(Clause {
            connector,
            condition,
        });
    }

    pub fn head(&self) -> &Condition {
        &self.head
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.tail
    }

    /// 子条件数量，至少为 1
    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    /// 按顺序遍历子条件，第一个子条件的连接符为 None
    pub fn children(&self) -> impl Iterator<Item = (Option<Connector>, &Condition)> {
        std::iter::once((None, self.head.as_ref()))
            .chain(self.tail.iter().map(|c| (Some(c.connector), &c.condition)))
    }
}

impl Condition {
    pub fn leaf(attribute: Attribute) -> Self {
        Condition::Leaf(attribute)
    }

    /// 空叶子：没有任何可识别 token 的查询编译结果
    pub fn empty() -> Self {
        Condition::Leaf(Attribute::default())
    }

    pub fn as_leaf(&self) -> Option<&Attribute> {
        match self {
            Condition::Leaf(attr) => Some(attr),
            Condition::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Condition::Group(group) => Some(group),
            Condition::Leaf(_) => None,
        }
    }

    /// 在顶层追加一个兄弟条件；叶子会先被包装成分组
    pub fn push_clause(&mut self, connector: Connector, condition: Condition) {
        match self {
            Condition::Group(group) => group.push(connector, condition),
            Condition::Leaf(_) => {
                let leaf = std::mem::replace(self, Condition::empty());
                let mut group = Group::new(leaf);
                group.push(connector, condition);
                *self = Condition::Group(group);
            }
        }
    }

    /// 按深度优先顺序访问所有叶子属性
    pub fn for_each_attribute<'a>(&'a self, f: &mut impl FnMut(&'a Attribute)) {
        match self {
            Condition::Leaf(attr) => f(attr),
            Condition::Group(group) => {
                for (_, child) in group.children() {
                    child.for_each_attribute(f);
                }
            }
        }
    }

    /// 树中出现的所有非空属性名（去重、排序）
    pub fn attribute_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.for_each_attribute(&mut |attr| {
            if !attr.is_empty() {
                names.insert(attr.name.clone());
            }
        });
        names
    }

    /// 是否至少包含一个非空属性。需要严格校验查询的调用方应检查此项
    pub fn has_attributes(&self) -> bool {
        let mut found = false;
        self.for_each_attribute(&mut |attr| found |= !attr.is_empty());
        found
    }

    /// 叶子数量
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.for_each_attribute(&mut |_| count += 1);
        count
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Leaf(attr) => write!(f, "{}", attr),
            Condition::Group(_) => write!(f, "({})", self),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Leaf(attr) => write!(f, "{}", attr),
            Condition::Group(group) => {
                for (connector, child) in group.children() {
                    if let Some(connector) = connector {
                        write!(f, " {} ", connector.symbol())?;
                    }
                    child.fmt_nested(f)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_inference() {
        assert_eq!(ValueType::infer("1"), ValueType::Numeric);
        assert_eq!(ValueType::infer("1200.50"), ValueType::Numeric);
        assert_eq!(ValueType::infer("1,000,000"), ValueType::Numeric);
        assert_eq!(ValueType::infer("1.2.3"), ValueType::Text);
        assert_eq!(ValueType::infer(".5"), ValueType::Text);
        assert_eq!(ValueType::infer("5."), ValueType::Text);
        assert_eq!(ValueType::infer("-3"), ValueType::Text);
        assert_eq!(ValueType::infer("12abc"), ValueType::Text);
        assert_eq!(ValueType::infer(""), ValueType::Text);
        assert_eq!(ValueType::infer(","), ValueType::Text);
    }

    #[test]
    fn test_date_inference() {
        assert_eq!(ValueType::infer("2020-01-01T00:00:00Z"), ValueType::Date);
        assert_eq!(ValueType::infer("2020-01-01T07:00:00+07:00"), ValueType::Date);
        assert_eq!(ValueType::infer("2019-09-09"), ValueType::Text);
    }

    #[test]
    fn test_connector_fold() {
        assert!(Connector::And.fold(true, true));
        assert!(!Connector::And.fold(true, false));
        assert!(Connector::Or.fold(false, true));
        assert!(!Connector::Or.fold(false, false));
    }

    #[test]
    fn test_push_clause_wraps_leaf() {
        let mut condition = Condition::leaf(Attribute::new("id", OperatorKind::Eq, "1"));
        condition.push_clause(
            Connector::And,
            Condition::leaf(Attribute::new("member_id", OperatorKind::Eq, "")),
        );

        let group = condition.as_group().expect("leaf should become a group");
        assert_eq!(group.len(), 2);
        assert_eq!(group.head().as_leaf().unwrap().name, "id");
        assert_eq!(group.clauses()[0].connector, Connector::And);
    }

    #[test]
    fn test_attribute_names_are_distinct() {
        let mut group = Group::new(Condition::leaf(Attribute::new("division", OperatorKind::Eq, "eng")));
        group.push(
            Connector::Or,
            Condition::leaf(Attribute::new("division", OperatorKind::Eq, "fin")),
        );
        let mut root = Group::new(Condition::leaf(Attribute::new("id", OperatorKind::Eq, "1")));
        root.push(Connector::And, Condition::Group(group));
        let condition = Condition::Group(root);

        let names: Vec<_> = condition.attribute_names().into_iter().collect();
        assert_eq!(names, vec!["division".to_string(), "id".to_string()]);
        assert_eq!(condition.leaf_count(), 3);
        assert!(condition.has_attributes());
    }

    #[test]
    fn test_empty_condition_has_no_attributes() {
        let condition = Condition::empty();
        assert!(!condition.has_attributes());
        assert!(condition.attribute_names().is_empty());
    }

    #[test]
    fn test_attribute_display_quotes_when_needed() {
        let plain = Attribute::new("division", OperatorKind::Eq, "engineering");
        assert_eq!(plain.to_string(), "division = engineering");

        let spaced = Attribute::new("name", OperatorKind::Contains, "Release Plan");
        assert_eq!(spaced.to_string(), "name |= \"Release Plan\"");

        let mut quoted_number = Attribute::new("code", OperatorKind::Eq, "007");
        quoted_number.value_type = ValueType::Text;
        assert_eq!(quoted_number.to_string(), "code = \"007\"");

        let mut quoted_date = Attribute::new("at", OperatorKind::Gt, "2020-01-01T00:00:00Z");
        quoted_date.value_type = ValueType::Text;
        assert_eq!(quoted_date.to_string(), "at > \"2020-01-01T00:00:00Z\"");
    }

    #[test]
    fn test_operator_serializes_as_symbol() {
        let attr = Attribute::new("score", OperatorKind::Gte, "10");
        let json = serde_json::to_string(&attr).unwrap();
        assert_eq!(
            json,
            r#"{"name":"score","operator":">=","value":"10","type":"numeric"}"#
        );
    }
}

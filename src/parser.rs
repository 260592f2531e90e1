//! 条件查询的语法分析器（条件树构建器）
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   └─ parse_group()   (单游标，遇到 '(' 时递归)
//!        ├─ '('          → 丢弃未完成的叶子，递归 parse_group()，
//!        │                 结果作为一个子节点挂到当前分组（使用待定连接符）
//!        ├─ ')'          → 结束当前层（顶层多余的 ')' 被忽略）
//!        ├─ '&&' / '||'  → 记录待定连接符，供下一个完成的子节点使用
//!        ├─ 比较运算符    → 设置当前打开叶子的运算符
//!        ├─ 操作数        ├─ 没有打开的叶子 → 以操作数为属性名打开叶子
//!        │                └─ 已有打开的叶子 → 操作数作为字面量，推断类型，
//!        │                                    叶子完成并追加到当前分组
//!        └─ Illegal       → 忽略
//! ```
//!
//! ## 语法
//!
//! ```text
//! expr := term (('&&' | '||') term)*
//! term := '(' expr ')' | name op literal
//! op   := = | != | < | <= | > | >= | |= | |~
//! ```
//!
//! `&&` 与 `||` 没有优先级：同一层的子节点严格从左到右折叠，
//! 只有括号能改变结合方式。
//!
//! 解析器是全函数：任何输入都会得到一棵树。没有任何完整叶子的查询
//! 得到一个空叶子（名字为空的属性），对真实数据求值总是 false。
//! 需要严格校验查询的调用方应检查 [`Condition::has_attributes`]。

use crate::ast::{Attribute, Condition, Connector, Group, OperatorKind, ValueType};
use crate::token::{Token, TokenKind};

pub struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    /// 构建条件树。根节点总是分组，除非查询中没有任何完整的叶子
    pub fn parse(&mut self) -> Condition {
        match self.parse_group(0) {
            Some(group) => Condition::Group(group),
            None => Condition::empty(),
        }
    }

    /// 解析一层分组，直到匹配的 ')' 或输入结束。没有子节点时返回 None
    /// 注意：顶层（depth 为 0）多余的 ')' 被忽略
    fn parse_group(&mut self, depth: usize) -> Option<Group> {
        let mut group: Option<Group> = None;
        let mut pending: Option<Connector> = None;
        let mut open: Option<Attribute> = None;

        while let Some(token) = self.advance() {
            match &token.kind {
                TokenKind::LParen => {
                    open = None;
                    if let Some(sub) = self.parse_group(depth + 1) {
                        attach(&mut group, pending.take(), Condition::Group(sub));
                    }
                }
                TokenKind::RParen => {
                    if depth > 0 {
                        break;
                    }
                }
                TokenKind::And => {
                    open = None;
                    pending = Some(Connector::And);
                }
                TokenKind::Or => {
                    open = None;
                    pending = Some(Connector::Or);
                }
                TokenKind::Operand(text) | TokenKind::Quoted(text) => match open.take() {
                    None => {
                        open = Some(Attribute {
                            name: text.clone(),
                            ..Attribute::default()
                        });
                    }
                    Some(mut attr) => {
                        attr.value_type = if token.is_quoted_literal() {
                            ValueType::Text
                        } else {
                            ValueType::infer(text)
                        };
                        attr.value = text.clone();
                        attach(&mut group, pending.take(), Condition::Leaf(attr));
                    }
                },
                TokenKind::Illegal(_) => {}
                kind => {
                    if let (Some(attr), Some(op)) = (open.as_mut(), OperatorKind::from_token(kind)) {
                        attr.operator = op;
                    }
                }
            }
        }

        group
    }
}

/// 把完成的子节点追加到分组；第一个子节点的连接符被忽略，其余默认 AND
fn attach(group: &mut Option<Group>, connector: Option<Connector>, child: Condition) {
    match group {
        None => *group = Some(Group::new(child)),
        Some(group) => group.push(connector.unwrap_or(Connector::And), child),
    }
}

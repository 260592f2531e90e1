//! 条件查询语言的 token 定义

/// token 是语言的最小单元，包含类型和在源文本中的位置
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// 是否为双引号包围的字面量
    pub fn is_quoted_literal(&self) -> bool {
        matches!(self.kind, TokenKind::Quoted(_))
    }
}

/// token 的类型
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // 操作数
    Operand(String), // 属性名或未加引号的字面量
    Quoted(String),  // 引号内的原始内容，不含引号

    // 逻辑连接符
    And, // &&
    Or,  // ||

    // 括号
    LParen, // (
    RParen, // )

    // 比较运算符
    Eq,            // =
    NotEq,         // !=
    Gt,            // >
    Lt,            // <
    Gte,           // >=
    Lte,           // <=
    Contains,      // |=
    ContainsRegex, // |~

    // 无法识别的字符，例如单独的 `&`
    Illegal(char),
}

/// 源文本中的区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// 起始字节偏移
    pub start: usize,
    /// 结束字节偏移
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

//! 条件查询的词法分析器
//!
//! 逐字符扫描输入：
//! - 引号外的空白字符被直接丢弃（不会切断操作数，`a b` 等价于 `ab`）
//! - `"` 切换原始字面量模式，引号内的内容原样保留
//! - `(`、`)`、`=` 总是单字符 token
//! - `<`、`>` 向后看一个字符组成 `<=`、`>=`
//! - `&&`、`||`、`|=`、`|~`、`!=` 通过向后看识别
//! - 其他字符累积为操作数，遇到分隔符时输出
//!
//! 词法分析器本身从不报错，无法识别的字符产生 `Illegal` token，由语法分析器忽略。

use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 返回下一个位置的字符，不推进位置
    fn peek_next(&self) -> Option<char> {
        self.input[self.position..].chars().nth(1)
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 当前字符是否会结束一个操作数
    fn at_delimiter(&self) -> bool {
        match self.peek() {
            Some('(' | ')' | '=' | '~' | '<' | '>' | '&' | '|' | '"') => true,
            Some('!') => self.peek_next() == Some('='),
            _ => false,
        }
    }

    /// 读取双引号包围的字面量
    /// 注意：开始的引号已经被调用者消费；缺少结束引号时读到输入末尾
    fn read_quoted(&mut self, start: usize) -> Token {
        let content_start = self.position;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            self.bump();
        }
        let content_end = self.position;
        self.bump(); // 消费结束引号

        let content = &self.input[content_start..content_end];
        Token::new(
            TokenKind::Quoted(content.to_string()),
            Span::new(start, self.position),
        )
    }

    /// 读取一个分隔符 token，调用前必须确认 `at_delimiter()`
    fn read_delimiter(&mut self) -> Option<Token> {
        let start = self.position;
        let c = self.bump()?;

        let kind = match c {
            '"' => return Some(self.read_quoted(start)),
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '=' => TokenKind::Eq,
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Lte
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Gte
                } else {
                    TokenKind::Gt
                }
            }
            '!' => {
                self.bump(); // 消费 '='
                TokenKind::NotEq
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                    TokenKind::And
                } else {
                    TokenKind::Illegal('&')
                }
            }
            '|' => match self.peek() {
                Some('|') => {
                    self.bump();
                    TokenKind::Or
                }
                Some('=') => {
                    self.bump();
                    TokenKind::Contains
                }
                Some('~') => {
                    self.bump();
                    TokenKind::ContainsRegex
                }
                _ => TokenKind::Illegal('|'),
            },
            other => TokenKind::Illegal(other),
        };
        Some(Token::new(kind, Span::new(start, self.position)))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buffer = String::new();
        let mut start = self.position;
        let mut end = self.position;

        loop {
            let Some(c) = self.peek() else {
                break; // 到达输入末尾
            };
            if c.is_whitespace() {
                self.bump();
                continue;
            }
            if self.at_delimiter() {
                if !buffer.is_empty() {
                    break; // 先输出累积的操作数，分隔符留给下一次调用
                }
                return self.read_delimiter();
            }
            if buffer.is_empty() {
                start = self.position;
            }
            self.bump();
            buffer.push(c);
            end = self.position;
        }

        if buffer.is_empty() {
            None
        } else {
            Some(Token::new(TokenKind::Operand(buffer), Span::new(start, end)))
        }
    }
}

/// 对整个查询分词
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

//! 页码范围表达式
//!
//! 把 `"1-3,9-7,12"` 这样的文本转换为有序的页码区间列表。
//! 列表的顺序就是输出文档的页面顺序。

use std::fmt;

use crate::error::RangeParseError;

/// 闭区间页码 `[from, to]`，从 1 开始
///
/// 解析结果中总有 `from <= to`：降序范围会被展开成单页区间，
/// 因为页面复制只支持升序的连续区间。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSpan {
    pub from: u32,
    pub to: u32,
}

impl PageSpan {
    /// 单页区间
    pub fn single(page: u32) -> Self {
        Self {
            from: page,
            to: page,
        }
    }

    /// 区间内的页数
    pub fn page_count(&self) -> u32 {
        self.to - self.from + 1
    }

    pub fn is_single(&self) -> bool {
        self.from == self.to
    }

    /// 按升序遍历区间内的页码
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.from..=self.to
    }
}

impl fmt::Display for PageSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

/// 解析页码范围表达式
///
/// - `n` → `(n, n)`
/// - `a-b` 且 `a <= b` → `(a, b)`
/// - `a-b` 且 `a > b` → `(a, a), (a-1, a-1), …, (b, b)`
///
/// 所有空白字符都会被忽略。任何一项非法都返回错误，不返回部分结果。
pub fn parse_range_expr(expr: &str) -> Result<Vec<PageSpan>, RangeParseError> {
    let compact: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(RangeParseError::EmptyExpression);
    }

    let mut spans = Vec::new();
    for token in compact.split(',') {
        if token.is_empty() {
            return Err(RangeParseError::EmptyToken {
                expr: expr.to_string(),
            });
        }
        parse_token(token, &mut spans)?;
    }

    Ok(spans)
}

/// 解析单个 token，结果追加到 `spans`
fn parse_token(token: &str, spans: &mut Vec<PageSpan>) -> Result<(), RangeParseError> {
    if !token.contains('-') {
        spans.push(PageSpan::single(parse_page(token, token)?));
        return Ok(());
    }

    let operands: Vec<&str> = token.split('-').collect();
    if operands.len() != 2 {
        return Err(RangeParseError::WrongOperandCount {
            token: token.to_string(),
            operands: operands.len(),
        });
    }

    let from = parse_page(operands[0], token)?;
    let to = parse_page(operands[1], token)?;

    if from <= to {
        spans.push(PageSpan { from, to });
    } else {
        spans.extend((to..=from).rev().map(PageSpan::single));
    }

    Ok(())
}

fn parse_page(operand: &str, token: &str) -> Result<u32, RangeParseError> {
    // u32::from_str 接受前导 '+'，这里只允许纯数字
    if operand.is_empty() || !operand.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeParseError::NotANumber {
            token: token.to_string(),
        });
    }

    let page: u32 = operand.parse().map_err(|_| RangeParseError::NotANumber {
        token: token.to_string(),
    })?;

    if page == 0 {
        return Err(RangeParseError::ZeroPage {
            token: token.to_string(),
        });
    }

    Ok(page)
}

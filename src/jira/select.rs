//! Interactive numbered filter picker.

use std::io::{BufRead, Write};

use super::client::SavedFilter;
use crate::error::Result;

const RULE: &str = "========================================";
const NAME_WIDTH: usize = 20;

/// Print the numbered list, two entries per line.
pub fn print_filter_menu(filters: &[SavedFilter], out: &mut impl Write) -> Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "🔍 可供选择的过滤器:")?;
    for (index, filter) in filters.iter().enumerate() {
        let number = index + 1;
        if index % 2 == 0 {
            write!(out, "{number:>2}. {:<NAME_WIDTH$}", filter.name)?;
            if index == filters.len() - 1 {
                writeln!(out)?;
            }
        } else {
            writeln!(out, "{number:>2}. {}", filter.name)?;
        }
    }
    writeln!(out, "{RULE}")?;
    Ok(())
}

/// Ask for a filter by number until a valid one is chosen.
///
/// Returns `None` when the user types `exit` or `q`, or input ends.
pub fn select_filter<'a>(
    filters: &'a [SavedFilter],
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<&'a SavedFilter>> {
    print_filter_menu(filters, out)?;

    let mut line = String::new();
    loop {
        write!(out, "\n请输入过滤器序号 (例如：1, 2, 3...)：\n（输入 'exit' 或 'q' 退出）\n> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let choice = line.trim();

        if choice.eq_ignore_ascii_case("exit") || choice.eq_ignore_ascii_case("q") {
            writeln!(out, "程序已退出。👋")?;
            return Ok(None);
        }

        let selected = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| filters.get(index));

        match selected {
            Some(filter) => {
                writeln!(out, "\n✅ 已选择 (序号 {choice})：{}", filter.name)?;
                writeln!(out, "JQL: {}", filter.jql)?;
                return Ok(Some(filter));
            }
            None => writeln!(out, "\n❌ 错误：'{choice}' 不是一个有效的序号，请重新输入。")?,
        }
    }
}

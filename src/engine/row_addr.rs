// ==========================================
// BOQ 自动核价系统 - 写回行号换算
// ==========================================
// 铁律: 全部行号算术集中在此纯函数，写回点不得内联计算
//
// 历史缺陷: 写回时误用"减表头行"或漏加偏移，导致成本写进表头带
// 或整体错位一行。契约固定为:
//   目标行 = header_row_index + source_row_index + 2
// 其中 +1 跨过表头行自身，+1 把 0-based 下标换算为 1-based 行号
// ==========================================

/// 清单项写回的绝对行号（1-based Excel 行）
///
/// - header_row_index: 模式表头行下标（0-based）
/// - source_row_index: 数据块内行下标（0-based，表头后首行为 0）
#[inline]
pub fn absolute_row(header_row_index: usize, source_row_index: usize) -> u32 {
    (header_row_index + source_row_index + 2) as u32
}

// ==========================================
// BOQ 自动核价系统 - 名称标准化
// ==========================================
// 职责: 匹配前的统一文本规整
// 规则: 去首尾空白 / 压缩内部空白 / 小写化 / 引号统一为 ASCII
// 匹配引擎与仓储的 name_normalized 列共用此函数，两侧必须一致
// ==========================================

/// 标准化名称
///
/// BOQ 表与主数据常由不同人员录入，弯引号、重音符、
/// 多余空格是历史上最常见的"同名不匹配"原因
pub fn normalize_name(raw: &str) -> String {
    let mut unified = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\u{201C}' | '\u{201D}' => unified.push('"'), // 弯双引号
            '\u{2018}' | '\u{2019}' => unified.push('\''), // 弯单引号
            '`' | '\u{00B4}' => unified.push('\''),        // 反引号/重音符
            _ => unified.push(ch),
        }
    }

    // 压缩内部空白并小写化
    unified
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 是否为合计/小计等控制行关键字（不参与核价的行）
pub fn is_totals_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ["total", "subtotal", "sum", "รวม"]
        .iter()
        .any(|kw| lowered.contains(kw))
}

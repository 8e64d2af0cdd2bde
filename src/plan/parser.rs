//! LLM 输出解析：剥离 Markdown 代码块、解析计划记录、提取图表代码
//!
//! LLM 常把 JSON 或 Mermaid 包在 ```json / ```mermaid / ``` 中，内容可能另起一行也可能与标签同行，
//! 也可能完全不加代码块；这里统一容忍。

use schemars::schema_for;

use crate::core::AgentError;
use crate::plan::StepDraft;

const FENCE: &str = "```";

/// 与内容同行时仍会被剥离的语言标签
const INLINE_LABELS: [&str; 8] = [
    "json", "mermaid", "javascript", "js", "text", "txt", "markdown", "md",
];

/// 取出第一个代码块的内容；无代码块时返回 None
///
/// 开头 ``` 后同一行若是单个词（如 json、mermaid），视为语言标签跳过；
/// 整个代码块只有一行时，只剥离常见标签，避免误删 `graph` 之类的内容。缺少结尾 ``` 时取到文本末尾。
pub fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find(FENCE)?;
    let rest = &text[start + FENCE.len()..];
    let block = match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    };

    let body = match block.find('\n') {
        Some(nl) => {
            let first_line = block[..nl].trim();
            if first_line.is_empty() || is_language_tag(first_line) {
                &block[nl + 1..]
            } else {
                block
            }
        }
        None => strip_inline_label(block),
    };
    Some(body.trim())
}

/// 优先取标注为 label 的代码块（如 ```json），没有时退回第一个代码块
pub fn extract_labeled_block<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let marker = format!("{}{}", FENCE, label);
    let mut from = 0;
    while let Some(pos) = text[from..].find(&marker) {
        let after = from + pos + marker.len();
        let rest = &text[after..];
        // ```jsonl 之类不算
        if rest.chars().next().map_or(true, |c| !c.is_ascii_alphanumeric()) {
            let end = rest.find(FENCE).unwrap_or(rest.len());
            return Some(rest[..end].trim());
        }
        from = after;
    }
    extract_fenced_block(text)
}

fn is_language_tag(s: &str) -> bool {
    !s.contains(char::is_whitespace)
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

fn strip_inline_label(line: &str) -> &str {
    let line = line.trim_start();
    let (label, content) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    if INLINE_LABELS.iter().any(|l| l.eq_ignore_ascii_case(label)) {
        content
    } else {
        line
    }
}

/// 去掉包裹的代码块（优先 label 标注的），否则返回去空白后的原文
pub fn strip_code_fence<'a>(text: &'a str, label: &str) -> &'a str {
    extract_labeled_block(text, label).unwrap_or_else(|| text.trim())
}

/// 将规划 LLM 的原始输出解析为步骤草稿列表
///
/// 失败情况：非 JSON、字段缺失、Agent 名不在枚举内、列表为空。
pub fn parse_plan(raw: &str) -> Result<Vec<StepDraft>, AgentError> {
    let content = strip_code_fence(raw, "json");
    let drafts: Vec<StepDraft> = serde_json::from_str(content)
        .map_err(|e| AgentError::PlanParse(format!("{}: {}", e, content)))?;

    if drafts.is_empty() {
        return Err(AgentError::PlanParse("plan contains no steps".to_string()));
    }
    if let Some(pos) = drafts.iter().position(|d| d.description.trim().is_empty()) {
        return Err(AgentError::PlanParse(format!(
            "step {} has an empty description",
            pos + 1
        )));
    }
    Ok(drafts)
}

/// 从可视化 Agent 的输出中提取图表代码；无代码块时回退为整段去空白文本
pub fn extract_diagram(raw: &str) -> String {
    strip_code_fence(raw, "mermaid").to_string()
}

/// 计划记录的 JSON Schema，拼入规划 system prompt
pub fn plan_schema_json() -> String {
    let schema = schema_for!(Vec<StepDraft>);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

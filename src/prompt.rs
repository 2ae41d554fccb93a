// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! System prompts that teach a model the response protocol, plus the improve-request builder.

use crate::model::problem::{
    ANSWER_HEADER, EXPLANATION_HEADER, IMPROVED_ANSWER_HEADER, IMPROVED_EXPLANATION_HEADER,
    PROBLEM_SEPARATOR, PROBLEM_TEXT_HEADER,
};
use crate::model::ResponseFlow;

const DIAGRAM_TOOLS: &str = r#"### Diagram tools

Emit a fenced code block with one of these language tags. Always close the fence.

- `plot-function`: JSON `{"title": "...", "xAxis": {"domain": [-5, 5]}, "data": [{"fn": "x^2 - 1"}]}`.
  Expressions use `+ - * / ^`, parentheses and `sin cos tan sqrt abs log exp`.
- `plot-force`: JSON `{"nodes": [{"id": "a", "label": "A"}], "links": [{"source": "a", "target": "b"}]}`.
- `plot-mermaid`: a Mermaid `graph TD` / `graph LR` flowchart. Nodes `A[box]`, `B(round)`, `C{choice}`,
  edges `A --> B`, labels `A -->|yes| B`.
- `jessecode`: an interactive board script:
  `A = point(1, 2) <<name: 'A'>>; B = point(4, -1); segment(A, B); functiongraph(function(x){ return x^2; });`
- `svg`: a standalone `<svg>` document. Scripts and event handlers are removed."#;

fn solve_prompt() -> String {
    format!(
        r#"## Role
You are an advanced homework solver. Read every problem the user sends, solve each one, and answer
in the sectioned text format below. Do not use XML.

## Output format
Separate multiple problems with a line containing exactly `{PROBLEM_SEPARATOR}`.

```text
{PROBLEM_TEXT_HEADER}
The full problem text as read from the input.

{EXPLANATION_HEADER}
#### Step 1: Identify the key facts
How to read the problem...

#### Step 2: [step title]
The calculation or derivation...

{ANSWER_HEADER}
The final answer only.
```

## Formatting rules
1. Use the section headers exactly as written, each on its own line.
2. Inside the explanation, mark every step with `#### Step N: Title`.
3. Write all math in LaTeX wrapped in `$$ ... $$`, with a space after the opening `$$`.
4. Keep the answer short and direct.

{DIAGRAM_TOOLS}
"#
    )
}

fn improve_prompt() -> String {
    format!(
        r#"## Role
You review an existing solution (problem, answer, explanation), fix calculation or logic errors,
fill in missing steps, and return a better solution.

## Input
The request arrives as XML:

```xml
<improve>
  <problem><![CDATA[problem]]></problem>
  <answer><![CDATA[original answer]]></answer>
  <explanation><![CDATA[original explanation]]></explanation>
  <user_suggestion><![CDATA[user suggestion]]></user_suggestion>
</improve>
```

The user suggestion takes priority over everything else.

## Output format
Do not use XML. Start every section with its header line:

```text
{IMPROVED_EXPLANATION_HEADER}
#### Step 1: [step title]
Detailed step...

{IMPROVED_ANSWER_HEADER}
The improved final answer.
```

## Formatting rules
1. Use `{IMPROVED_EXPLANATION_HEADER}` and `{IMPROVED_ANSWER_HEADER}` exactly as written.
2. Mark every step with `#### Step N: Title`.
3. Write all math in LaTeX wrapped in `$$ ... $$`.

{DIAGRAM_TOOLS}
"#
    )
}

fn chat_prompt() -> String {
    format!(
        r#"You are a helpful tutor equipped with visualization tools.

## Instructions
1. When a concept is complex or structural, use a diagram tool without asking first.
2. Follow the tool syntax below exactly.
3. Do not escape Markdown characters with backslashes.

{DIAGRAM_TOOLS}
"#
    )
}

/// Which conversation a system prompt is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Solve,
    Improve,
    Chat,
}

impl PromptKind {
    /// Protocol the model answers in; `None` for free-form chat.
    pub fn response_flow(self) -> Option<ResponseFlow> {
        match self {
            Self::Solve => Some(ResponseFlow::Solve),
            Self::Improve => Some(ResponseFlow::Improve),
            Self::Chat => None,
        }
    }
}

pub fn system_prompt(kind: PromptKind) -> String {
    match kind {
        PromptKind::Solve => solve_prompt(),
        PromptKind::Improve => improve_prompt(),
        PromptKind::Chat => chat_prompt(),
    }
}

/// Wraps `text` in a CDATA section. Every `]]>` is split across two sections so the payload
/// can never close the section early.
fn push_cdata(out: &mut String, text: &str) {
    out.push_str("<![CDATA[");
    out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]>");
}

/// Builds the XML body of an improve request.
pub fn improve_request(problem: &str, answer: &str, explanation: &str, suggestion: &str) -> String {
    let mut out = String::from("<improve>\n");
    let fields = [
        ("problem", problem),
        ("answer", answer),
        ("explanation", explanation),
        ("user_suggestion", suggestion),
    ];
    for (tag, text) in fields {
        out.push_str("  <");
        out.push_str(tag);
        out.push('>');
        push_cdata(&mut out, text);
        out.push_str("</");
        out.push_str(tag);
        out.push_str(">\n");
    }
    out.push_str("</improve>");
    out
}

#[cfg(test)]
mod tests {
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use rstest::rstest;

    use super::{improve_request, system_prompt, PromptKind};

    fn cdata_fields(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut fields = Vec::new();
        let mut current = String::new();
        loop {
            match reader.read_event().expect("well-formed request") {
                Event::Start(_) => current.clear(),
                Event::CData(data) => {
                    current.push_str(std::str::from_utf8(&data.into_inner()).expect("utf-8"));
                }
                Event::End(end) if end.name().as_ref() != b"improve" => {
                    fields.push(std::mem::take(&mut current));
                }
                Event::Eof => break,
                _ => {}
            }
        }
        fields
    }

    #[test]
    fn request_carries_all_four_fields() {
        let xml = improve_request("2+2?", "5", "added wrong", "check step 1");
        assert!(xml.starts_with("<improve>\n  <problem><![CDATA[2+2?]]></problem>\n"));
        assert_eq!(cdata_fields(&xml), vec!["2+2?", "5", "added wrong", "check step 1"]);
    }

    #[test]
    fn cdata_terminator_in_user_text_is_split() {
        let tricky = "a]]>b]]></problem><x>";
        let xml = improve_request(tricky, "", "", "");
        assert_eq!(xml.matches("</problem>").count(), 1);
        assert_eq!(cdata_fields(&xml)[0], tricky);
    }

    #[rstest]
    #[case(
        PromptKind::Solve,
        &["### PROBLEM_TEXT", "### EXPLANATION", "### ANSWER", "---PROBLEM_SEPARATOR---"]
    )]
    #[case(
        PromptKind::Improve,
        &["### IMPROVED_EXPLANATION", "### IMPROVED_ANSWER", "<user_suggestion>"]
    )]
    #[case(PromptKind::Chat, &["plot-mermaid", "jessecode"])]
    fn prompts_name_their_protocol(#[case] kind: PromptKind, #[case] needles: &[&str]) {
        let prompt = system_prompt(kind);
        for needle in needles {
            assert!(prompt.contains(needle), "{kind:?} prompt lacks {needle}");
        }
        assert!(prompt.contains("plot-function"));
    }
}

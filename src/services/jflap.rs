//! JFLAP (.jff) 自动机文件生成
//!
//! 输出格式：
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8" standalone="no"?>
//! <!--Created with JFLAP 7.1-->
//! <structure><type>fa</type><automaton>
//!   <state id="0" name="q0"><x>100.0</x><y>100.0</y><initial/></state>
//!   <transition><from>0</from><to>1</to><read>a</read></transition>
//! </automaton></structure>
//! ```
//!
//! JFLAP 拒绝没有状态的自动机，所以没有数据时输出最小占位自动机。

use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::models::{AutomatonKind, FiniteAutomaton, QuestionEntry, State, Transition};
use crate::utils::write_atomic;

pub const JFLAP_HEADER: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n<!--Created with JFLAP 7.1-->\n";

/// 每行放几个状态
const GRID_COLUMNS: usize = 6;
const GRID_STEP: f64 = 100.0;
const GRID_ORIGIN: f64 = 100.0;

/// 生成单个自动机的 JFLAP 文本
pub fn render(kind: AutomatonKind, fa: Option<&FiniteAutomaton>) -> Result<String> {
    kind.ensure_supported()?;

    let automaton = match fa {
        Some(fa) if !fa.is_empty() => normalized(fa),
        Some(_) => empty_placeholder(kind),
        None => missing_placeholder(kind),
    };

    let mut out = JflapXml::new();
    out.start("structure")?;
    out.text_element("type", kind.as_str())?;
    out.start("automaton")?;

    for (idx, state) in automaton.states.iter().enumerate() {
        out.state(state, idx)?;
    }
    for transition in &automaton.transitions {
        out.transition(transition, kind == AutomatonKind::Mealy)?;
    }

    out.end("automaton")?;
    out.end("structure")?;

    let body = out.finish()?;
    Ok(format!("{}{}", JFLAP_HEADER, body))
}

/// 单个题目的自动机
pub fn render_entry(kind: AutomatonKind, entry: &QuestionEntry) -> Result<String> {
    render(kind, entry.fa.as_ref())
}

/// 整个文件的汇总自动机：取第一个带有非空自动机的题目
pub fn render_consolidated(kind: AutomatonKind, entries: &[QuestionEntry]) -> Result<String> {
    let fa = entries
        .iter()
        .filter_map(|e| e.fa.as_ref())
        .find(|fa| !fa.is_empty())
        .or_else(|| entries.iter().find_map(|e| e.fa.as_ref()));
    render(kind, fa)
}

/// 写出 .jff 文件（自动创建父目录）
pub async fn write_jflap(path: &Path, xml: &str) -> Result<()> {
    write_atomic(path, xml).await?;
    debug!("JFLAP 文件已写出: {}", path.display());
    Ok(())
}

/// 保证恰好一个初始状态
fn normalized(fa: &FiniteAutomaton) -> FiniteAutomaton {
    let mut fa = fa.clone();
    let initial_count = fa.states.iter().filter(|s| s.initial).count();

    if fa.initial_state().is_none() {
        warn!("⚠️ 自动机没有初始状态，将第一个状态设为初始状态");
        if let Some(first) = fa.states.first_mut() {
            first.initial = true;
        }
    } else if initial_count > 1 {
        warn!("⚠️ 自动机有 {} 个初始状态，只保留第一个", initial_count);
        let mut seen = false;
        for state in fa.states.iter_mut().filter(|s| s.initial) {
            if seen {
                state.initial = false;
            }
            seen = true;
        }
    }

    fa
}

/// 自动机存在但没有状态
fn empty_placeholder(kind: AutomatonKind) -> FiniteAutomaton {
    let mut q0 = State::new(0, "q0");
    q0.initial = true;

    let transitions = match kind {
        AutomatonKind::Mealy => Vec::new(),
        _ => vec![Transition::new(0, 0, Some("a"))],
    };

    FiniteAutomaton {
        states: vec![q0],
        transitions,
        ..Default::default()
    }
}

/// 完全没有自动机数据
fn missing_placeholder(kind: AutomatonKind) -> FiniteAutomaton {
    if kind == AutomatonKind::Mealy {
        return empty_placeholder(kind);
    }

    let mut q0 = State::new(0, "q0");
    q0.initial = true;
    let mut q1 = State::new(1, "q1");
    q1.is_final = true;

    FiniteAutomaton {
        states: vec![q0, q1],
        transitions: vec![
            Transition::new(0, 1, Some("a")),
            Transition::new(1, 1, Some("b")),
        ],
        ..Default::default()
    }
}

fn grid_position(idx: usize) -> (f64, f64) {
    let x = GRID_ORIGIN + (idx % GRID_COLUMNS) as f64 * GRID_STEP;
    let y = GRID_ORIGIN + (idx / GRID_COLUMNS) as f64 * GRID_STEP;
    (x, y)
}

/// quick-xml 写出器的薄封装
struct JflapXml {
    writer: Writer<Vec<u8>>,
}

impl JflapXml {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| AppError::Xml(e.to_string()))
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.write(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str) -> Result<()> {
        self.write(Event::Empty(BytesStart::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        if text.is_empty() {
            return self.empty(name);
        }
        self.start(name)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn state(&mut self, state: &State, idx: usize) -> Result<()> {
        let id = state.id.to_string();
        let name = state.display_name();
        let (x, y) = grid_position(idx);

        let start = BytesStart::new("state").with_attributes([("id", id.as_str()), ("name", name.as_str())]);
        self.write(Event::Start(start))?;
        self.text_element("x", &format!("{:.1}", x))?;
        self.text_element("y", &format!("{:.1}", y))?;
        if state.initial {
            self.empty("initial")?;
        }
        if state.is_final {
            self.empty("final")?;
        }
        self.end("state")
    }

    fn transition(&mut self, transition: &Transition, with_output: bool) -> Result<()> {
        self.start("transition")?;
        self.text_element("from", &transition.from.to_string())?;
        self.text_element("to", &transition.to.to_string())?;
        let read = if transition.is_epsilon() {
            ""
        } else {
            transition.read.as_deref().unwrap_or_default()
        };
        self.text_element("read", read)?;
        if with_output {
            self.empty("transout")?;
        }
        self.end("transition")
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| AppError::Xml(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    fn sample_fa() -> FiniteAutomaton {
        let mut q0 = State::new(0, "q0");
        q0.initial = true;
        let mut q1 = State::new(1, "");
        q1.is_final = true;
        FiniteAutomaton {
            alphabet: ["a".to_string()].into_iter().collect(),
            states: vec![q0, q1],
            transitions: vec![Transition::new(0, 1, Some("a")), Transition::new(1, 0, None)],
        }
    }

    #[test]
    fn test_header_and_structure() {
        let xml = render(AutomatonKind::Fa, Some(&sample_fa())).unwrap();
        assert!(xml.starts_with(JFLAP_HEADER));
        assert!(xml.contains("<structure><type>fa</type><automaton>"));
        assert!(xml.ends_with("</automaton></structure>"));
    }

    #[test]
    fn test_states_and_transitions() {
        let xml = render(AutomatonKind::Fa, Some(&sample_fa())).unwrap();
        assert!(xml.contains(r#"<state id="0" name="q0"><x>100.0</x><y>100.0</y><initial/></state>"#));
        assert!(xml.contains(r#"<state id="1" name="q1"><x>200.0</x><y>100.0</y><final/></state>"#));
        assert!(xml.contains("<transition><from>0</from><to>1</to><read>a</read></transition>"));
        // epsilon
        assert!(xml.contains("<transition><from>1</from><to>0</to><read/></transition>"));
        assert!(!xml.contains("transout"));
    }

    #[test]
    fn test_grid_wraps_after_six_states() {
        assert_eq!(grid_position(5), (600.0, 100.0));
        assert_eq!(grid_position(6), (100.0, 200.0));
        assert_eq!(grid_position(13), (200.0, 300.0));
    }

    #[test]
    fn test_zero_states_yields_single_initial_state() {
        let xml = render(AutomatonKind::Fa, Some(&FiniteAutomaton::default())).unwrap();
        assert_eq!(count(&xml, "<state "), 1);
        assert_eq!(count(&xml, "<initial/>"), 1);
        assert!(xml.contains("<transition><from>0</from><to>0</to><read>a</read></transition>"));

        let mealy = render(AutomatonKind::Mealy, Some(&FiniteAutomaton::default())).unwrap();
        assert_eq!(count(&mealy, "<state "), 1);
        assert_eq!(count(&mealy, "<initial/>"), 1);
        assert_eq!(count(&mealy, "<transition>"), 0);
    }

    #[test]
    fn test_missing_automaton_placeholder() {
        let xml = render(AutomatonKind::Fa, None).unwrap();
        assert_eq!(count(&xml, "<state "), 2);
        assert_eq!(count(&xml, "<initial/>"), 1);
        assert_eq!(count(&xml, "<final/>"), 1);
        assert!(xml.contains("<from>0</from><to>1</to><read>a</read>"));
        assert!(xml.contains("<from>1</from><to>1</to><read>b</read>"));
    }

    #[test]
    fn test_mealy_adds_transout() {
        let xml = render(AutomatonKind::Mealy, Some(&sample_fa())).unwrap();
        assert!(xml.contains("<type>mealy</type>"));
        assert_eq!(count(&xml, "<transout/>"), 2);
    }

    #[test]
    fn test_exactly_one_initial_state() {
        let mut fa = sample_fa();
        fa.states[0].initial = false;
        let xml = render(AutomatonKind::Fa, Some(&fa)).unwrap();
        assert_eq!(count(&xml, "<initial/>"), 1);

        let mut fa = sample_fa();
        fa.states[1].initial = true;
        let xml = render(AutomatonKind::Fa, Some(&fa)).unwrap();
        assert_eq!(count(&xml, "<initial/>"), 1);
        assert!(xml.contains(r#"name="q0"><x>100.0</x><y>100.0</y><initial/>"#));
    }

    #[test]
    fn test_symbols_are_escaped() {
        let mut fa = sample_fa();
        fa.transitions = vec![Transition::new(0, 1, Some("<"))];
        let xml = render(AutomatonKind::Fa, Some(&fa)).unwrap();
        assert!(xml.contains("<read>&lt;</read>"));
    }

    #[test]
    fn test_unsupported_kinds() {
        for kind in [AutomatonKind::Moore, AutomatonKind::Dfa] {
            let err = render(kind, Some(&sample_fa())).unwrap_err();
            assert!(matches!(err, AppError::UnimplementedFeature { .. }));
        }
    }

    #[test]
    fn test_consolidated_uses_first_nonempty_automaton() {
        let mut first = QuestionEntry::new("Q1", "sem fa");
        first.fa = Some(FiniteAutomaton::default());
        let mut second = QuestionEntry::new("Q2", "com fa");
        second.fa = Some(sample_fa());

        let xml = render_consolidated(AutomatonKind::Fa, &[QuestionEntry::new("Q0", ""), first, second]).unwrap();
        assert_eq!(count(&xml, "<state "), 2);
        assert!(xml.contains("<read/>"));
    }
}

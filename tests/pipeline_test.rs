//! 端到端流程测试：用脚本化的提取器和富化服务驱动 FileProcessor / App

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use quiz_extract::cli::RunOptions;
use quiz_extract::infrastructure::DocumentExtractor;
use quiz_extract::models::{AutomatonKind, ProcessingStatus, StatusStore};
use quiz_extract::orchestrator::{App, FileProcessor};
use quiz_extract::services::{EnrichedQuestion, EnrichmentResult, EnrichmentService};
use quiz_extract::{AnswerMode, AppError, Config, Result};

const LISTA: &str = "\
Lista de exercícios 1
Questão 1
a) Construa um AFD para L = {w | w termina em a}
b) Construa um AFN equivalente
Questão 2
Mostre que L é regular.
Questão 3
Qual linguagem é regular?
A) a^n b^n
B) (ab)*";

const IDS: [&str; 4] = ["Q1a", "Q1b", "Q2", "Q3"];

/// 按文件名返回固定文本；未知文件视为损坏
struct ScriptedExtractor {
    texts: HashMap<String, String>,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            texts: pairs
                .iter()
                .map(|(name, text)| (name.to_string(), text.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

impl DocumentExtractor for ScriptedExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.texts
            .get(&name)
            .cloned()
            .ok_or_else(|| AppError::extraction(path, "arquivo corrompido"))
    }
}

/// 统计调用次数；`fail_on` 指定第几次调用（从 1 开始）返回不可重试错误
struct CountingEnricher {
    calls: AtomicUsize,
    fail_on: Option<usize>,
}

impl CountingEnricher {
    fn new() -> Arc<Self> {
        Self::failing_on(None)
    }

    fn failing_on(fail_on: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrichmentService for CountingEnricher {
    async fn enrich(&self, _prompt: &str) -> Result<EnrichmentResult> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(n) {
            return Err(AppError::Upstream {
                model: "teste".into(),
                message: "401 unauthorized".into(),
            });
        }

        let question = EnrichedQuestion::from_value(&json!({
            "id": "Q",
            "resposta": format!("resposta {}", n),
            "correta": "B",
            "fa": {
                "alphabet": ["a"],
                "states": [{"id": 0, "name": "q0", "initial": true, "final": true}],
                "transitions": [{"from": 0, "to": 0, "read": "a"}]
            }
        }))
        .unwrap();

        Ok(EnrichmentResult {
            questions: vec![question],
        })
    }
}

struct Workspace {
    _dir: tempfile::TempDir,
    input_dir: PathBuf,
    output_dir: PathBuf,
    log_file: PathBuf,
}

impl Workspace {
    fn new(files: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("lerpdf");
        let output_dir = dir.path().join("out");
        std::fs::create_dir_all(&input_dir).unwrap();
        for name in files {
            std::fs::write(input_dir.join(name), b"conteudo binario").unwrap();
        }
        let log_file = dir.path().join("run.log");
        Self {
            _dir: dir,
            input_dir,
            output_dir,
            log_file,
        }
    }

    fn config(&self, mode: AnswerMode) -> Config {
        Config {
            llm_api_key: "teste".into(),
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            max_per_block: 2,
            answer_mode: mode,
            log_file: self.log_file.clone(),
            ..Config::default()
        }
    }

    fn options(&self, kind: AutomatonKind, refresh: bool) -> RunOptions {
        RunOptions {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            kind,
            refresh,
            solved_dir: "resolvidas".into(),
        }
    }

    fn processor(
        &self,
        extractor: Arc<ScriptedExtractor>,
        enricher: Arc<CountingEnricher>,
        mode: AnswerMode,
        kind: AutomatonKind,
        refresh: bool,
    ) -> FileProcessor {
        FileProcessor::new(
            extractor,
            enricher,
            &self.config(mode),
            &self.options(kind, refresh),
        )
    }

    fn input(&self, name: &str) -> PathBuf {
        self.input_dir.join(name)
    }

    fn out(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

#[tokio::test]
async fn test_first_run_writes_all_artifacts() {
    let ws = Workspace::new(&["lista.pdf"]);
    let extractor = ScriptedExtractor::new(&[("lista.pdf", LISTA)]);
    let enricher = CountingEnricher::new();
    let processor = ws.processor(extractor, enricher.clone(), AnswerMode::Fa, AutomatonKind::Fa, false);

    let outcome = processor.process(&ws.input("lista.pdf"), 1).await.unwrap();

    assert_eq!(outcome.entries, 4);
    assert_eq!(outcome.enriched, 4);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(enricher.calls(), 4);

    assert_eq!(std::fs::read_to_string(ws.out("lista.txt")).unwrap(), LISTA);
    assert!(ws.out("lista_segmented.json").is_file());
    for id in IDS {
        assert!(ws.out(&format!("lista_{}.txt", id)).is_file(), "txt de {}", id);
        assert!(ws.out(&format!("lista_{}.json", id)).is_file(), "json de {}", id);
        assert!(ws.out(&format!("resolvidas/lista_{}.jff", id)).is_file(), "jff de {}", id);
    }
    assert_eq!(outcome.consolidated, ws.out("lista.jff"));

    let q3 = std::fs::read_to_string(ws.out("lista_Q3.txt")).unwrap();
    assert!(q3.contains("A) a^n b^n\nB) (ab)*\nCorreta: B"));

    let status = StatusStore::new(&ws.output_dir).load_entry("lista.pdf").await.unwrap();
    assert!(status.text_extracted && status.segmented && status.done);
    assert_eq!(status.blocks_done, 2);
    assert_eq!(status.questions_done.len(), 4);
}

#[tokio::test]
async fn test_rerun_without_refresh_makes_no_calls() {
    let ws = Workspace::new(&["lista.pdf"]);
    let extractor = ScriptedExtractor::new(&[("lista.pdf", LISTA)]);

    let first = CountingEnricher::new();
    ws.processor(extractor.clone(), first.clone(), AnswerMode::Fa, AutomatonKind::Fa, false)
        .process(&ws.input("lista.pdf"), 1)
        .await
        .unwrap();
    assert_eq!(first.calls(), 4);

    let second = CountingEnricher::new();
    let outcome = ws
        .processor(extractor.clone(), second.clone(), AnswerMode::Fa, AutomatonKind::Fa, false)
        .process(&ws.input("lista.pdf"), 1)
        .await
        .unwrap();

    assert_eq!(second.calls(), 0);
    assert_eq!(outcome.skipped, 4);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refresh_resets_checkpoint_but_keeps_outputs() {
    let ws = Workspace::new(&["lista.pdf"]);
    let extractor = ScriptedExtractor::new(&[("lista.pdf", LISTA)]);

    ws.processor(extractor.clone(), CountingEnricher::new(), AnswerMode::Fa, AutomatonKind::Fa, false)
        .process(&ws.input("lista.pdf"), 1)
        .await
        .unwrap();

    // 刷新后第一次调用就失败：此时进度应已清空，旧文件仍在
    let failing = CountingEnricher::failing_on(Some(1));
    let err = ws
        .processor(extractor.clone(), failing.clone(), AnswerMode::Fa, AutomatonKind::Fa, true)
        .process(&ws.input("lista.pdf"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Upstream { .. }));

    let status = StatusStore::new(&ws.output_dir).load_entry("lista.pdf").await.unwrap();
    assert!(status.questions_done.is_empty());
    assert_eq!(status.blocks_done, 0);
    assert!(!status.done);
    assert!(status.text_extracted && status.segmented);

    assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
    for id in IDS {
        assert!(ws.out(&format!("lista_{}.json", id)).is_file());
    }
    assert!(ws.out("lista.jff").is_file());
}

#[tokio::test]
async fn test_crash_resumes_from_last_completed_question() {
    let ws = Workspace::new(&["lista.pdf"]);
    let extractor = ScriptedExtractor::new(&[("lista.pdf", LISTA)]);

    // 第 3 次调用失败，模拟中途中断
    let crashing = CountingEnricher::failing_on(Some(3));
    let result = ws
        .processor(extractor.clone(), crashing.clone(), AnswerMode::Qa, AutomatonKind::Fa, false)
        .process(&ws.input("lista.pdf"), 1)
        .await;
    assert!(result.is_err());

    let status = StatusStore::new(&ws.output_dir).load_entry("lista.pdf").await.unwrap();
    let done: Vec<_> = status.questions_done.iter().cloned().collect();
    assert_eq!(done, vec!["Q1a", "Q1b"]);
    assert_eq!(status.blocks_done, 1);
    assert!(!status.done);

    let resumed = CountingEnricher::new();
    let outcome = ws
        .processor(extractor.clone(), resumed.clone(), AnswerMode::Qa, AutomatonKind::Fa, false)
        .process(&ws.input("lista.pdf"), 1)
        .await
        .unwrap();

    assert_eq!(resumed.calls(), 2);
    assert_eq!(outcome.skipped, 2);
    assert_eq!(outcome.enriched, 2);
    assert_eq!(outcome.consolidated, ws.out("lista_respostas.txt"));

    // 汇总里包含之前完成的题目的答案
    let answers = std::fs::read_to_string(ws.out("lista_respostas.txt")).unwrap();
    assert!(answers.contains("[Q1a] a) Construa um AFD"));
    assert!(answers.contains("Resposta: resposta 1"));
    assert!(answers.contains("Resposta: resposta 2"));
    assert!(answers.contains("[Q3] Questão 3"));
    assert_eq!(answers.matches("Resposta:").count(), 4);
}

#[tokio::test]
async fn test_unimplemented_kind_fails_before_touching_files() {
    let ws = Workspace::new(&["lista.pdf"]);
    let extractor = ScriptedExtractor::new(&[("lista.pdf", LISTA)]);
    let enricher = CountingEnricher::new();

    for kind in [AutomatonKind::Moore, AutomatonKind::Dfa] {
        let err = ws
            .processor(extractor.clone(), enricher.clone(), AnswerMode::Fa, kind, false)
            .process(&ws.input("lista.pdf"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnimplementedFeature { .. }));
    }

    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(enricher.calls(), 0);
    assert!(!ws.out("status.json").exists());
}

#[tokio::test]
async fn test_mealy_writes_transout() {
    let ws = Workspace::new(&["lista.docx"]);
    let extractor = ScriptedExtractor::new(&[("lista.docx", LISTA)]);

    ws.processor(extractor, CountingEnricher::new(), AnswerMode::Fa, AutomatonKind::Mealy, false)
        .process(&ws.input("lista.docx"), 1)
        .await
        .unwrap();

    let jff = std::fs::read_to_string(ws.out("resolvidas/lista_Q2.jff")).unwrap();
    assert!(jff.contains("<type>mealy</type>"));
    assert!(jff.contains("<transout/>"));
}

#[tokio::test]
async fn test_bad_file_does_not_abort_batch() {
    let ws = Workspace::new(&["a_corrompido.pdf", "b_lista.docx", "notas.txt"]);
    let extractor = ScriptedExtractor::new(&[("b_lista.docx", LISTA)]);
    let enricher = CountingEnricher::new();

    let app = App::with_services(
        ws.config(AnswerMode::Fa),
        ws.options(AutomatonKind::Fa, false),
        extractor,
        enricher.clone(),
    )
    .unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(enricher.calls(), 4);
    assert!(ws.out("b_lista.jff").is_file());

    let log = std::fs::read_to_string(&ws.log_file).unwrap();
    assert!(log.contains("a_corrompido.pdf"));
    assert!(log.contains("arquivo corrompido"));
}

#[tokio::test]
async fn test_document_without_questions_still_completes() {
    let ws = Workspace::new(&["vazio.pdf"]);
    let extractor = ScriptedExtractor::new(&[("vazio.pdf", "apenas um parágrafo\nsem questões")]);
    let enricher = CountingEnricher::new();

    let outcome = ws
        .processor(extractor, enricher.clone(), AnswerMode::Fa, AutomatonKind::Fa, false)
        .process(&ws.input("vazio.pdf"), 1)
        .await
        .unwrap();

    assert_eq!(outcome.entries, 0);
    assert_eq!(enricher.calls(), 0);
    // 没有自动机时输出占位
    let jff = std::fs::read_to_string(ws.out("vazio.jff")).unwrap();
    assert_eq!(jff.matches("<initial/>").count(), 1);
}

#[tokio::test]
async fn test_unreadable_segmentation_cache_is_rebuilt() {
    let ws = Workspace::new(&["lista.pdf"]);
    std::fs::create_dir_all(&ws.output_dir).unwrap();
    std::fs::write(ws.out("lista_segmented.json"), r#"{"questoes": [{"id": "Q1a"#).unwrap();

    let extractor = ScriptedExtractor::new(&[("lista.pdf", LISTA)]);
    let enricher = CountingEnricher::new();
    let outcome = ws
        .processor(extractor, enricher.clone(), AnswerMode::Fa, AutomatonKind::Fa, false)
        .process(&ws.input("lista.pdf"), 1)
        .await
        .unwrap();

    assert_eq!(outcome.entries, 4);
    assert_eq!(enricher.calls(), 4);

    let cached = std::fs::read_to_string(ws.out("lista_segmented.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&cached).unwrap();
    assert_eq!(doc["questoes"].as_array().map(Vec::len), Some(4));
    assert!(!ws.out("lista_segmented.json.tmp").exists());
}

#[tokio::test]
async fn test_refresh_clears_checkpoints_of_removed_files() {
    let ws = Workspace::new(&["lista.pdf"]);
    let store = StatusStore::new(&ws.output_dir);
    let mut stale = ProcessingStatus {
        text_extracted: true,
        done: true,
        ..Default::default()
    };
    store.save_entry("removido.pdf", &mut stale).await.unwrap();

    let app = App::with_services(
        ws.config(AnswerMode::Fa),
        ws.options(AutomatonKind::Fa, true),
        ScriptedExtractor::new(&[("lista.pdf", LISTA)]),
        CountingEnricher::new(),
    )
    .unwrap();
    let stats = app.run().await.unwrap();
    assert_eq!(stats.success, 1);

    let ledger = store.load().await.unwrap();
    assert!(!ledger.contains_key("removido.pdf"));
    assert!(ledger["lista.pdf"].done);
}

//! Text-classification pipeline assembled from candle building blocks.
//!
//! Resolves `config.json`, `tokenizer.json` and the weights for a fine-tuned
//! BERT or DistilBERT sequence classifier, either from a local directory or
//! from the Hugging Face Hub, and runs the forward pass on the CPU.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Error as E, Result};
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use log::{info, warn};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};

use crate::models::analysis::LabelScore;

const MAX_SEQUENCE_LENGTH: usize = 512;
const DEFAULT_NUM_LABELS: usize = 2;

struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
    use_pth: bool,
}

/// The parts of `config.json` that describe the classification head.
#[derive(Debug, Deserialize)]
struct HeadConfig {
    model_type: Option<String>,
    #[serde(default)]
    id2label: HashMap<String, String>,
    dim: Option<usize>,
}

impl HeadConfig {
    /// Label names by class index, `LABEL_{i}` where `id2label` has no entry.
    fn labels(&self) -> Vec<String> {
        let num_labels = if self.id2label.is_empty() {
            DEFAULT_NUM_LABELS
        } else {
            self.id2label.len()
        };
        (0..num_labels)
            .map(|i| {
                self.id2label
                    .get(&i.to_string())
                    .cloned()
                    .unwrap_or_else(|| format!("LABEL_{}", i))
            })
            .collect()
    }
}

enum ClassificationHead {
    Bert {
        model: BertModel,
        pooler: Linear,
        classifier: Linear,
    },
    DistilBert {
        model: DistilBertModel,
        pre_classifier: Linear,
        classifier: Linear,
    },
}

pub struct TextClassificationPipeline {
    head: ClassificationHead,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    device: Device,
}

impl TextClassificationPipeline {
    /// Loads the model named by `model_id` (a local directory or a Hub repo id).
    ///
    /// Hub downloads land in `cache_dir`. Weights are memory-mapped when they
    /// ship as safetensors.
    pub fn load(model_id: &str, cache_dir: &Path) -> Result<Self> {
        let device = Device::Cpu;
        let files = resolve_model_files(model_id, cache_dir)?;

        let raw_config = std::fs::read_to_string(&files.config)
            .with_context(|| format!("reading {}", files.config.display()))?;
        let head_config: HeadConfig = serde_json::from_str(&raw_config)?;
        let labels = head_config.labels();

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(E::msg)?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(E::msg)?;
        tokenizer.with_padding(None);

        let vb = if files.use_pth {
            VarBuilder::from_pth(&files.weights, DType::F32, &device)?
        } else {
            unsafe { VarBuilder::from_mmaped_safetensors(&[files.weights.clone()], DType::F32, &device)? }
        };

        let head = match head_config.model_type.as_deref() {
            Some("bert") => {
                let config: BertConfig = serde_json::from_str(&raw_config)?;
                let hidden = config.hidden_size;
                ClassificationHead::Bert {
                    model: BertModel::load(vb.pp("bert"), &config)?,
                    pooler: candle_nn::linear(hidden, hidden, vb.pp("bert.pooler.dense"))?,
                    classifier: candle_nn::linear(hidden, labels.len(), vb.pp("classifier"))?,
                }
            }
            Some("distilbert") => {
                let config: DistilBertConfig = serde_json::from_str(&raw_config)?;
                let dim = head_config
                    .dim
                    .ok_or_else(|| anyhow!("config.json for a distilbert model has no `dim`"))?;
                ClassificationHead::DistilBert {
                    model: DistilBertModel::load(vb.pp("distilbert"), &config)?,
                    pre_classifier: candle_nn::linear(dim, dim, vb.pp("pre_classifier"))?,
                    classifier: candle_nn::linear(dim, labels.len(), vb.pp("classifier"))?,
                }
            }
            other => bail!("unsupported model_type {:?}, expected bert or distilbert", other),
        };

        info!(
            "Loaded {} classifier {} with {} labels",
            head_config.model_type.as_deref().unwrap_or("?"),
            model_id,
            labels.len()
        );

        Ok(Self {
            head,
            tokenizer,
            labels,
            device,
        })
    }

    /// Returns the top label and its softmax probability.
    pub fn classify(&self, text: &str) -> Result<Vec<LabelScore>> {
        let logits = self.logits(text)?;
        let probabilities = candle_nn::ops::softmax(&logits, D::Minus1)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        let (index, score) = probabilities
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .ok_or_else(|| anyhow!("model produced no logits"))?;

        let label = self
            .labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{}", index));

        Ok(vec![LabelScore::new(label, score)])
    }

    fn logits(&self, text: &str) -> Result<Tensor> {
        let encoding = self.tokenizer.encode(text, true).map_err(E::msg)?;
        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;

        match &self.head {
            ClassificationHead::Bert {
                model,
                pooler,
                classifier,
            } => {
                let token_type_ids = input_ids.zeros_like()?;
                let attention_mask =
                    Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;
                let hidden = model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
                let pooled = pooler.forward(&hidden.i((.., 0))?)?.tanh()?;
                Ok(classifier.forward(&pooled)?)
            }
            ClassificationHead::DistilBert {
                model,
                pre_classifier,
                classifier,
            } => {
                // Single unpadded sequence: nothing is masked out.
                let len = encoding.get_ids().len();
                let mask = Tensor::zeros((len, len), DType::U8, &self.device)?;
                let hidden = model.forward(&input_ids, &mask)?;
                let pooled = pre_classifier.forward(&hidden.i((.., 0))?)?.relu()?;
                Ok(classifier.forward(&pooled)?)
            }
        }
    }
}

fn resolve_model_files(model_id: &str, cache_dir: &Path) -> Result<ModelFiles> {
    let local = Path::new(model_id);
    if local.is_dir() {
        let (weights, use_pth) = if local.join("model.safetensors").exists() {
            (local.join("model.safetensors"), false)
        } else if local.join("pytorch_model.bin").exists() {
            (local.join("pytorch_model.bin"), true)
        } else {
            bail!("No model weights found in {}", model_id);
        };
        return Ok(ModelFiles {
            config: local.join("config.json"),
            tokenizer: local.join("tokenizer.json"),
            weights,
            use_pth,
        });
    }

    info!("Fetching {} from the Hugging Face Hub into {}", model_id, cache_dir.display());
    let api = ApiBuilder::new()
        .with_cache_dir(cache_dir.to_path_buf())
        .with_progress(false)
        .build()?;
    let repo = api.repo(Repo::with_revision(
        model_id.to_string(),
        RepoType::Model,
        "main".to_string(),
    ));

    let config = repo.get("config.json")?;
    let tokenizer = repo.get("tokenizer.json")?;
    let (weights, use_pth) = match repo.get("model.safetensors") {
        Ok(weights) => (weights, false),
        Err(e) => {
            warn!("model.safetensors unavailable ({}), trying pytorch_model.bin", e);
            (repo.get("pytorch_model.bin")?, true)
        }
    };

    Ok(ModelFiles {
        config,
        tokenizer,
        weights,
        use_pth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;

    const ID2LABEL: &str = r#"{"0": "LABEL_0", "1": "LABEL_1", "2": "LABEL_2", "3": "LABEL_3", "4": "LABEL_4"}"#;

    const TOKENIZER_JSON: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": {
            "type": "TemplateProcessing",
            "single": [
                {"SpecialToken": {"id": "[CLS]", "type_id": 0}},
                {"Sequence": {"id": "A", "type_id": 0}},
                {"SpecialToken": {"id": "[SEP]", "type_id": 0}}
            ],
            "pair": [
                {"SpecialToken": {"id": "[CLS]", "type_id": 0}},
                {"Sequence": {"id": "A", "type_id": 0}},
                {"SpecialToken": {"id": "[SEP]", "type_id": 0}},
                {"Sequence": {"id": "B", "type_id": 1}},
                {"SpecialToken": {"id": "[SEP]", "type_id": 1}}
            ],
            "special_tokens": {
                "[CLS]": {"id": "[CLS]", "ids": [1], "tokens": ["[CLS]"]},
                "[SEP]": {"id": "[SEP]", "ids": [2], "tokens": ["[SEP]"]}
            }
        },
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {
                "[PAD]": 0, "[CLS]": 1, "[SEP]": 2, "[UNK]": 3,
                "please": 4, "send": 5, "my": 6, "transcript": 7,
                "fee": 8, "payment": 9, "class": 10, "schedule": 11
            },
            "unk_token": "[UNK]"
        }
    }"#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bolt-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes a randomly initialised one-layer model with five labels into `dir`.
    fn write_tiny_model(dir: &Path, model_type: &str) {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);

        let config = match model_type {
            "bert" => {
                let config = format!(
                    r#"{{"model_type": "bert", "vocab_size": 12, "hidden_size": 8,
                        "num_hidden_layers": 1, "num_attention_heads": 2, "intermediate_size": 16,
                        "hidden_act": "gelu", "hidden_dropout_prob": 0.0, "max_position_embeddings": 32,
                        "type_vocab_size": 2, "initializer_range": 0.02, "layer_norm_eps": 1e-12,
                        "pad_token_id": 0, "position_embedding_type": "absolute", "use_cache": false,
                        "classifier_dropout": null, "id2label": {}}}"#,
                    ID2LABEL
                );
                let bert_config: BertConfig = serde_json::from_str(&config).unwrap();
                BertModel::load(vb.pp("bert"), &bert_config).unwrap();
                candle_nn::linear(8, 8, vb.pp("bert.pooler.dense")).unwrap();
                candle_nn::linear(8, 5, vb.pp("classifier")).unwrap();
                config
            }
            "distilbert" => {
                let config = format!(
                    r#"{{"model_type": "distilbert", "vocab_size": 12, "dim": 8, "n_layers": 1,
                        "n_heads": 2, "hidden_dim": 16, "activation": "gelu",
                        "max_position_embeddings": 32, "initializer_range": 0.02, "pad_token_id": 0,
                        "dropout": 0.0, "attention_dropout": 0.0, "seq_classif_dropout": 0.0,
                        "sinusoidal_pos_embds": false, "id2label": {}}}"#,
                    ID2LABEL
                );
                let distil_config: DistilBertConfig = serde_json::from_str(&config).unwrap();
                DistilBertModel::load(vb.pp("distilbert"), &distil_config).unwrap();
                candle_nn::linear(8, 8, vb.pp("pre_classifier")).unwrap();
                candle_nn::linear(8, 5, vb.pp("classifier")).unwrap();
                config
            }
            other => panic!("no tiny model for {}", other),
        };

        varmap.save(dir.join("model.safetensors")).unwrap();
        std::fs::write(dir.join("config.json"), config).unwrap();
        std::fs::write(dir.join("tokenizer.json"), TOKENIZER_JSON).unwrap();
    }

    fn assert_top_label(result: &[LabelScore]) {
        assert_eq!(result.len(), 1);
        let top = &result[0];
        let known = ["LABEL_0", "LABEL_1", "LABEL_2", "LABEL_3", "LABEL_4"];
        assert!(known.contains(&top.label.as_str()), "unexpected label {}", top.label);
        // Top-1 of a five-way softmax is never below uniform.
        assert!(top.score >= 0.2 - 1e-6 && top.score <= 1.0, "score {}", top.score);
    }

    fn classify_with(model_type: &str) {
        let dir = scratch_dir(&format!("tiny-{}", model_type));
        write_tiny_model(&dir, model_type);

        let pipeline = TextClassificationPipeline::load(dir.to_str().unwrap(), &dir);
        let outputs = pipeline.map(|pipeline| {
            (
                pipeline.classify("please send my transcript").unwrap(),
                pipeline.classify("words nobody taught it").unwrap(),
                pipeline.classify("").unwrap(),
                pipeline.labels.clone(),
            )
        });
        std::fs::remove_dir_all(&dir).ok();

        let (known, unknown, empty, labels) = outputs.unwrap();
        assert_eq!(labels, vec!["LABEL_0", "LABEL_1", "LABEL_2", "LABEL_3", "LABEL_4"]);
        assert_top_label(&known);
        assert_top_label(&unknown);
        assert_top_label(&empty);
    }

    #[test]
    fn test_bert_head_classifies_text() {
        classify_with("bert");
    }

    #[test]
    fn test_distilbert_head_classifies_text() {
        classify_with("distilbert");
    }

    #[test]
    fn test_classification_is_deterministic() {
        let dir = scratch_dir("tiny-repeat");
        write_tiny_model(&dir, "bert");
        let pipeline = TextClassificationPipeline::load(dir.to_str().unwrap(), &dir).unwrap();
        let first = pipeline.classify("fee payment").unwrap();
        let second = pipeline.classify("fee payment").unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unsupported_model_type_fails_to_load() {
        let dir = scratch_dir("tiny-roberta");
        write_tiny_model(&dir, "bert");
        std::fs::write(dir.join("config.json"), r#"{"model_type": "roberta"}"#).unwrap();
        let result = TextClassificationPipeline::load(dir.to_str().unwrap(), &dir);
        std::fs::remove_dir_all(&dir).ok();
        let err = result.err().expect("roberta should be rejected");
        assert!(err.to_string().contains("unsupported model_type"));
    }

    fn head_config(json: &str) -> HeadConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_labels_follow_id2label_order() {
        let config = head_config(
            r#"{"model_type": "distilbert", "id2label": {"1": "LABEL_1", "0": "LABEL_0", "2": "LABEL_2"}}"#,
        );
        assert_eq!(config.labels(), vec!["LABEL_0", "LABEL_1", "LABEL_2"]);
    }

    #[test]
    fn test_missing_id2label_uses_default_names() {
        let config = head_config(r#"{"model_type": "bert"}"#);
        assert_eq!(config.labels(), vec!["LABEL_0", "LABEL_1"]);
    }

    #[test]
    fn test_gaps_in_id2label_fall_back_to_generic_names() {
        let config = head_config(r#"{"id2label": {"0": "Course Registration", "2": "General Inquiry"}}"#);
        assert_eq!(config.labels(), vec!["Course Registration", "LABEL_1"]);
    }

    #[test]
    fn test_local_directory_without_weights_is_an_error() {
        let dir = std::env::temp_dir().join(format!("bolt-empty-model-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let result = resolve_model_files(dir.to_str().unwrap(), &dir);
        std::fs::remove_dir_all(&dir).ok();
        let err = result.err().expect("expected a missing-weights error");
        assert!(err.to_string().contains("No model weights found"));
    }

    #[test]
    fn test_local_directory_prefers_safetensors() {
        let dir = std::env::temp_dir().join(format!("bolt-local-model-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("model.safetensors"), b"").unwrap();
        std::fs::write(dir.join("pytorch_model.bin"), b"").unwrap();
        let files = resolve_model_files(dir.to_str().unwrap(), &dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert!(!files.use_pth);
        assert!(files.weights.ends_with("model.safetensors"));
        assert!(files.tokenizer.ends_with("tokenizer.json"));
    }
}

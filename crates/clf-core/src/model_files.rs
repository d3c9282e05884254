//! Утилиты для работы с файлами модели на диске.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::{ClfError, ClfResult};

/// Конфигурация классификатора (метки, размеры слоёв).
pub const CONFIG_FILE: &str = "config.json";

/// Конфигурация экстрактора признаков (необязательна).
pub const PREPROCESSOR_CONFIG_FILE: &str = "preprocessor_config.json";

#[derive(serde::Deserialize)]
struct SafetensorsIndex {
    weight_map: HashMap<String, String>,
}

/// Найденные файлы директории модели.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: Option<PathBuf>,
    pub preprocessor_config: Option<PathBuf>,
    pub weights: Vec<PathBuf>,
    /// Ошибка разрешения весов (для отчёта `check`).
    pub weights_error: Option<String>,
}

impl ModelFiles {
    /// Осмотреть директорию модели, не падая на отсутствующих файлах.
    pub fn inspect(model_dir: impl AsRef<Path>) -> Self {
        let model_dir = model_dir.as_ref();
        let existing = |name: &str| {
            let p = model_dir.join(name);
            p.is_file().then_some(p)
        };
        let (weights, weights_error) = match resolve_safetensors_files(model_dir) {
            Ok(w) => (w, None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        };
        Self {
            config: existing(CONFIG_FILE),
            preprocessor_config: existing(PREPROCESSOR_CONFIG_FILE),
            weights,
            weights_error,
        }
    }

    /// Достаточно ли файлов для загрузки классификатора.
    pub fn is_ready(&self) -> bool {
        self.config.is_some() && !self.weights.is_empty()
    }

    /// Суммарный размер весов в байтах.
    pub fn weights_size_bytes(&self) -> u64 {
        self.weights
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum()
    }
}

/// Разрешить список safetensors-файлов в директории модели.
///
/// Поддерживает:
/// - `model.safetensors` (один файл)
/// - `model.safetensors.index.json` + шардированные `model-00001-of-0000N.safetensors`
/// - fallback: поиск `model-*-of-*.safetensors` без index.json
pub fn resolve_safetensors_files(model_dir: impl AsRef<Path>) -> ClfResult<Vec<PathBuf>> {
    let model_dir = model_dir.as_ref();

    let single = model_dir.join("model.safetensors");
    if single.exists() {
        return Ok(vec![single]);
    }

    let index_path = model_dir.join("model.safetensors.index.json");
    if index_path.exists() {
        let data = std::fs::read(&index_path)?;
        let idx: SafetensorsIndex = serde_json::from_slice(&data)?;

        // Порядок не важен для VarBuilder, но для детерминизма сортируем.
        let uniq: BTreeSet<&String> = idx.weight_map.values().collect();

        let mut out = Vec::with_capacity(uniq.len());
        for shard in uniq {
            let p = model_dir.join(shard);
            if !p.exists() {
                return Err(ClfError::Model(format!(
                    "В index.json указан шард, но файл не найден: {}",
                    p.display()
                )));
            }
            out.push(p);
        }

        if out.is_empty() {
            return Err(ClfError::Model(format!(
                "Пустой weight_map в {}",
                index_path.display()
            )));
        }

        return Ok(out);
    }

    let mut shards: Vec<PathBuf> = Vec::new();
    if model_dir.is_dir() {
        for entry in std::fs::read_dir(model_dir)? {
            let p = entry?.path();
            if !p.is_file() {
                continue;
            }
            let Some(name) = p.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with("model-") && name.ends_with(".safetensors") && name.contains("-of-")
            {
                shards.push(p);
            }
        }
    }
    shards.sort();
    if !shards.is_empty() {
        return Ok(shards);
    }

    Err(ClfError::Model(format!(
        "В директории модели не найден ни model.safetensors, ни model.safetensors.index.json, ни шардов model-*-of-*.safetensors: {}",
        model_dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("voiceclf-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_weights_reported() {
        let dir = scratch_dir("missing");
        let files = ModelFiles::inspect(&dir);
        assert!(!files.is_ready());
        assert!(files.weights_error.is_some());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_single_file_resolved() {
        let dir = scratch_dir("single");
        std::fs::write(dir.join("model.safetensors"), b"stub").unwrap();
        std::fs::write(dir.join(CONFIG_FILE), b"{}").unwrap();
        let files = ModelFiles::inspect(&dir);
        assert!(files.is_ready());
        assert_eq!(files.weights.len(), 1);
        assert!(files.preprocessor_config.is_none());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

//! 配置模块，负责加载校验器的JSON配置文件

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 配置加载错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(String),

    #[error("无法读取配置文件 {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析JSON配置文件 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 校验器配置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// 展平记录时去掉父级前缀，只保留最内层字段名（同名时后者覆盖前者）
    pub remove_prefix: bool,
    /// 把记录的字段名和条件中的属性名都转换为 snake_case 后再匹配
    pub snake_case_names: bool,
}

impl ValidatorConfig {
    /// 从JSON文件加载配置，缺省字段取默认值
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.display().to_string()));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source,
        })
    }

    pub fn with_remove_prefix(mut self, value: bool) -> Self {
        self.remove_prefix = value;
        self
    }

    pub fn with_snake_case_names(mut self, value: bool) -> Self {
        self.snake_case_names = value;
        self
    }
}

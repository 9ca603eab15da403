use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub instrument: InstrumentConfig,
    #[serde(default)]
    pub pitch: PitchConfig,
    #[serde(default)]
    pub osc: OscConfig,
}

/// 利き手。右利きはネックを左手で押さえ、右手で弾く
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    #[default]
    Right,
    Left,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InstrumentConfig {
    /// 両手首に必要な信頼度 (これを超える必要がある)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default)]
    pub handedness: Handedness,
    /// 腰中心を胴体高さの何割だけ持ち上げるか
    #[serde(default = "default_hip_lift")]
    pub hip_lift: f32,
    /// 腰中心からネック始点までの距離 (胴体高さ比)
    #[serde(default = "default_neck_start")]
    pub neck_start: f32,
    /// 腰中心からネック終点までの距離 (胴体高さ比)
    #[serde(default = "default_neck_end")]
    pub neck_end: f32,
    /// 腰中心からブリッジまでの距離 (胴体高さ比、負ならネックと逆側)
    #[serde(default = "default_bridge")]
    pub bridge: f32,
    /// ピックを手首から前腕方向へ延長する係数 (前腕長に掛ける)
    #[serde(default = "default_pick_extension")]
    pub pick_extension: f32,
}

fn default_confidence_threshold() -> f32 { 0.4 }
fn default_hip_lift() -> f32 { 0.2 }
fn default_neck_start() -> f32 { 0.3 }
fn default_neck_end() -> f32 { 1.5 }
fn default_bridge() -> f32 { -0.5 }
fn default_pick_extension() -> f32 { 0.005 }

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            handedness: Handedness::default(),
            hip_lift: default_hip_lift(),
            neck_start: default_neck_start(),
            neck_end: default_neck_end(),
            bridge: default_bridge(),
            pick_extension: default_pick_extension(),
        }
    }
}

/// 手首とネック始点の距離の測り方
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    /// 通常のユークリッド距離
    #[default]
    Euclidean,
    /// 旧実装互換: y成分にも x を使う擬似距離
    Legacy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PitchConfig {
    /// ピッチオフセットの最大値 (半音)
    #[serde(default = "default_pitch_range")]
    pub range: i32,
    #[serde(default)]
    pub distance: DistanceMode,
    /// true なら 0..=range に丸める。false なら範囲外もそのまま渡す
    #[serde(default)]
    pub clamp: bool,
}

fn default_pitch_range() -> i32 { 22 }

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            range: default_pitch_range(),
            distance: DistanceMode::default(),
            clamp: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OscConfig {
    /// 送信先 (音源側)
    #[serde(default = "default_osc_addr")]
    pub addr: String,
    /// OSCアドレスパターン
    #[serde(default = "default_osc_address")]
    pub address: String,
}

fn default_osc_addr() -> String { "127.0.0.1:57120".to_string() }
fn default_osc_address() -> String { "/guitar/strum".to_string() }

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            addr: default_osc_addr(),
            address: default_osc_address(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid config")?;
        Ok(config)
    }

    /// 読めなければデフォルト設定
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#} - using defaults", e);
                Self::default()
            }
        }
    }
}

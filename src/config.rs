//! Configuração do zero-entry carregada a partir de `zero-entry.toml`.
//!
//! A struct [`ZeroEntryConfig`] contém os nomes das listas, os atrasos do
//! despachante e as teclas do operador. Campos ausentes usam defaults e um
//! arquivo inexistente equivale a "tudo padrão". A variável de ambiente
//! `ZERO_ENTRY_CONFIG` tem precedência sobre o caminho padrão.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ZeroEntryError;
use crate::input::Key;

pub const DEFAULT_CONFIG_FILE: &str = "zero-entry.toml";
pub const CONFIG_ENV_VAR: &str = "ZERO_ENTRY_CONFIG";

/// Configuração de nível superior carregada de `zero-entry.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ZeroEntryConfig {
    /// Identificadores listados aqui nunca são digitados.
    #[serde(default = "default_exclusion_file")]
    pub exclusion_file: PathBuf,

    /// Identificadores listados aqui recebem a confirmação extra.
    #[serde(default = "default_special_file")]
    pub special_file: PathBuf,

    #[serde(default)]
    pub timings: Timings,

    #[serde(default)]
    pub keys: Keys,
}

/// Atrasos do despachante, em milissegundos.
#[derive(Debug, Clone, Deserialize)]
pub struct Timings {
    /// Intervalo entre ações dentro de um protocolo de entrada.
    #[serde(default = "default_action_delay_ms")]
    pub action_delay_ms: u64,

    /// Intervalo após cada item, antes da próxima consulta às teclas.
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,

    /// Espera após a confirmação do operador, para focar a janela alvo.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Intervalo de consulta durante a pausa e o keep-alive.
    #[serde(default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,

    /// Intervalo entre confirmações de keep-alive após o fim da lista.
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
}

/// Teclas do operador.
#[derive(Debug, Clone, Deserialize)]
pub struct Keys {
    /// Cancela a execução; também encerra o keep-alive.
    #[serde(default = "default_cancel_key")]
    pub cancel: Key,

    /// Alterna a pausa (uma vez pausa, outra vez retoma).
    #[serde(default = "default_pause_key")]
    pub pause: Key,

    /// Enviada após cada identificador e como sinal de keep-alive.
    #[serde(default = "default_confirm_key")]
    pub confirm: Key,
}

// Lista de exclusão padrão: `predefined_upcs.txt`.
fn default_exclusion_file() -> PathBuf {
    PathBuf::from("predefined_upcs.txt")
}

// Lista de itens especiais padrão: `multi_layout_upcs.txt`.
fn default_special_file() -> PathBuf {
    PathBuf::from("multi_layout_upcs.txt")
}

// Intervalo padrão entre ações: 1000ms.
fn default_action_delay_ms() -> u64 {
    1000
}

// Intervalo padrão entre itens: 1000ms.
fn default_item_delay_ms() -> u64 {
    1000
}

// Contagem regressiva padrão após a confirmação: 5000ms.
fn default_settle_delay_ms() -> u64 {
    5000
}

// Intervalo padrão de consulta durante a pausa: 100ms.
fn default_pause_poll_ms() -> u64 {
    100
}

// Intervalo padrão do keep-alive: 60s.
fn default_keepalive_interval_ms() -> u64 {
    60_000
}

// Tecla de cancelamento padrão: Esc.
fn default_cancel_key() -> Key {
    Key::Escape
}

// Tecla de pausa padrão: Shift.
fn default_pause_key() -> Key {
    Key::Shift
}

// Tecla de confirmação padrão: Enter.
fn default_confirm_key() -> Key {
    Key::Enter
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            action_delay_ms: default_action_delay_ms(),
            item_delay_ms: default_item_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            pause_poll_ms: default_pause_poll_ms(),
            keepalive_interval_ms: default_keepalive_interval_ms(),
        }
    }
}

impl Timings {
    pub fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay_ms)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self {
            cancel: default_cancel_key(),
            pause: default_pause_key(),
            confirm: default_confirm_key(),
        }
    }
}

impl Default for ZeroEntryConfig {
    fn default() -> Self {
        Self {
            exclusion_file: default_exclusion_file(),
            special_file: default_special_file(),
            timings: Timings::default(),
            keys: Keys::default(),
        }
    }
}

impl ZeroEntryConfig {
    /// Resolve o caminho da configuração: flag explícita, depois
    /// `ZERO_ENTRY_CONFIG`, depois `zero-entry.toml` no diretório atual.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Carrega a configuração de `path`.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load(path: &Path) -> Result<Self, ZeroEntryError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str::<ZeroEntryConfig>(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ZeroEntryError> {
        if self.timings.pause_poll_ms == 0 {
            return Err(ZeroEntryError::Config(
                "timings.pause_poll_ms must be greater than zero".into(),
            ));
        }
        if self.keys.cancel == self.keys.pause {
            return Err(ZeroEntryError::Config(format!(
                "cancel and pause keys must differ (both are {})",
                self.keys.cancel
            )));
        }
        Ok(())
    }
}

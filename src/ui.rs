//! Interface de terminal do zero-entry: barra de progresso e saída colorida.
//!
//! Usa `indicatif` para a barra de progresso e `console` para as cores. Os
//! avisos são impressos acima da barra para continuarem visíveis enquanto ela
//! é redesenhada. O [`StdinGate`] é a confirmação obrigatória do operador.

use std::io::BufRead;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Keys;
use crate::dispatch::{RunEvent, RunObserver, StartGate};
use crate::pipeline::WorkList;
use crate::state_machine::{RunOutcome, RunReport};

/// Indicador visual de progresso de uma execução.
///
/// Recebe os [`RunEvent`]s do despachante e mostra posição, percentual e ETA,
/// com avisos coloridos para pausa (amarelo) e retomada (verde).
pub struct RunProgress {
    // Barra de progresso do indicatif, dimensionada pela lista de trabalho.
    pb: ProgressBar,
    // Estilo verde para conclusão e retomada.
    green: Style,
    // Estilo amarelo para pausa e cancelamento.
    yellow: Style,
}

impl RunProgress {
    /// Cria a barra para `total` itens.
    pub fn new(total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("invalid template")
                .progress_chars("=> "),
        );
        Self {
            pb,
            green: Style::new().green().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Limpa a barra e imprime a linha de status final.
    pub fn finish(&self, report: &RunReport) {
        self.pb.finish_and_clear();
        match report.outcome {
            RunOutcome::Completed { dispatched, .. } => println!(
                "  {} Entered {dispatched}/{} identifiers",
                self.green.apply_to("✓"),
                report.total
            ),
            RunOutcome::Cancelled { at, dispatched } => println!(
                "  {} Operation cancelled by user before item {at} ({dispatched} entered)",
                self.yellow.apply_to("■")
            ),
        }
    }

    /// Deixa a barra onde a execução parou.
    pub fn abandon(&self) {
        self.pb.abandon();
    }
}

impl RunObserver for RunProgress {
    fn on_event(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Started { total } => {
                self.pb.set_length(*total as u64);
                self.pb.set_message("started");
            }
            RunEvent::Progress(p) => {
                self.pb.set_length(p.total as u64);
                self.pb.set_position(p.index as u64);
                self.pb.set_message(format!(
                    "{}% {} ({}) ETA {}s",
                    p.percent,
                    p.identifier,
                    p.protocol,
                    p.eta.as_secs()
                ));
            }
            RunEvent::Paused { at } => self.pb.println(format!(
                "  {} Paused before item {at}. Press the pause key again to continue.",
                self.yellow.apply_to("‖")
            )),
            RunEvent::Resumed { at } => self.pb.println(format!(
                "  {} Resuming at item {at}",
                self.green.apply_to("▶")
            )),
            RunEvent::Cancelled { at } => {
                self.pb.set_message(format!("cancelled before item {at}"));
            }
            RunEvent::KeepAlive { ticks } => {
                self.pb
                    .set_message(format!("done; keep-alive #{ticks}, press cancel to exit"));
            }
        }
    }
}

/// Imprime os identificadores selecionados para conferência do operador.
pub fn print_work_list(work: &WorkList) {
    let dim = Style::new().dim();
    println!("Extracted identifiers:");
    for item in work.items() {
        if item.special {
            println!("{} {}", item.identifier, dim.apply_to("(special)"));
        } else {
            println!("{}", item.identifier);
        }
    }
    println!("Total identifiers extracted: {}", work.len());
}

/// Imprime um erro fatal em vermelho na saída de erro.
pub fn print_error(message: &str) {
    eprintln!("  {} {message}", Style::new().red().bold().apply_to("✗"));
}

/// Imprime o relatório da execução como JSON formatado.
pub fn print_report(report: &RunReport) {
    println!("{}", Style::new().cyan().apply_to("─── Run Report ───"));
    println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
}

/// Confirmação bloqueante "pressione enter para começar" na entrada padrão.
pub struct StdinGate {
    // Teclas mostradas nas instruções.
    keys: Keys,
    // Duração da contagem regressiva anunciada.
    settle_secs: u64,
}

impl StdinGate {
    /// Cria a confirmação com as teclas e a contagem configuradas.
    pub fn new(keys: Keys, settle_secs: u64) -> Self {
        Self { keys, settle_secs }
    }
}

impl StartGate for StdinGate {
    fn acknowledge(&mut self) -> std::io::Result<()> {
        println!(
            "Press enter to start a {} second countdown, then focus the target window.",
            self.settle_secs
        );
        println!(
            "During the run: {} cancels, {} pauses and resumes.",
            self.keys.cancel, self.keys.pause
        );
        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "standard input closed before acknowledgment",
            ));
        }
        Ok(())
    }
}

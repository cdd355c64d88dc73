//! Interface de terminal do fmops-tuner: spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. O [`WorkflowProgress`] acompanha visualmente
//! o roteamento de mensagens e a espera pelos workflows iniciados.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use fmops_tuner::state_machine::{JobState, WorkflowRecord};
use fmops_tuner::{Dispatch, TunerError};

/// Indicador visual de progresso para um lote de mensagens roteadas.
///
/// Exibe um spinner animado enquanto os workflows rodam e mensagens
/// coloridas para sucesso (verde), falha (vermelho) e parada (amarelo).
pub struct WorkflowProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl WorkflowProgress {
    /// Inicia o spinner com a quantidade de mensagens recebidas.
    pub fn start(messages: usize) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Routing {messages} message(s)"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Mostra o resultado do roteamento de uma mensagem.
    pub fn dispatched(&self, result: &Result<Dispatch, TunerError>) {
        let line = match result {
            Ok(Dispatch::Started { execution_id }) => format!(
                "  {} Workflow started: {execution_id}",
                self.green.apply_to("▶")
            ),
            Ok(Dispatch::Stopped) => format!(
                "  {} Stop request answered with failure callback",
                self.yellow.apply_to("■")
            ),
            Err(e) => format!("  {} Message rejected: {e}", self.red.apply_to("✗")),
        };
        self.pb.println(line);
    }

    /// Atualiza o spinner enquanto espera os workflows em andamento.
    pub fn waiting(&self, running: usize) {
        self.pb
            .set_message(format!("Waiting for {running} workflow(s) to finish"));
    }

    /// Mostra o resultado de um workflow terminado.
    pub fn finished(&self, execution_id: &str, result: &Result<WorkflowRecord, TunerError>) {
        let line = match result {
            Ok(record) if record.final_state == JobState::Completed => format!(
                "  {} {execution_id} completed",
                self.green.apply_to("✓")
            ),
            Ok(record) => format!(
                "  {} {execution_id} ended {}",
                self.red.apply_to("✗"),
                record.final_state
            ),
            Err(e) => format!("  {} {execution_id} aborted: {e}", self.red.apply_to("✗")),
        };
        self.pb.println(line);
    }

    pub fn done(&self) {
        self.pb.finish_and_clear();
    }

    /// Imprime o registro do workflow formatado em JSON com estilo colorido.
    pub fn print_record(&self, record: &WorkflowRecord) {
        let style = match record.final_state {
            JobState::Completed => &self.green,
            JobState::Failed => &self.red,
            _ => &self.yellow,
        };
        println!();
        println!("{}", style.apply_to("─── Workflow Record ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(record).unwrap_or_default()
        );
    }
}

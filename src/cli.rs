//! Interface de linha de comando do fmops-tuner baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (route, step, status, jobs)
//! e flags globais (--config, --poll-interval, --max-poll-cycles, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// fmops-tuner: orquestra jobs de fine-tuning e reporta o resultado via token de callback.
#[derive(Debug, Parser)]
#[command(name = "fmops-tuner", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: fmops-tuner.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Espera entre consultas de status, em segundos.
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,

    /// Limite de ciclos de consulta antes de abortar o workflow.
    #[arg(long, global = true)]
    pub max_poll_cycles: Option<u32>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Roteia mensagens da fila e espera os workflows iniciados terminarem.
    Route {
        /// Arquivo JSON com uma mensagem, um array ou um envelope `Records` (`-` = stdin).
        input: String,
    },

    /// Executa um único passo do workflow sobre um payload e imprime o resultado.
    Step {
        /// Arquivo JSON com o payload do workflow (`-` = stdin).
        input: String,
    },

    /// Mostra o status bruto e classificado de um job.
    Status {
        /// Nome ou ARN do job.
        job_name: String,
    },

    /// Lista os jobs recentes do provedor.
    Jobs {
        /// Número máximo de jobs retornados.
        #[arg(long, default_value_t = 20)]
        max_results: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_route_subcommand() {
        let cli = Cli::parse_from(["fmops-tuner", "route", "messages.json"]);
        match cli.command {
            Command::Route { input } => assert_eq!(input, "messages.json"),
            _ => panic!("expected Route command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "fmops-tuner",
            "--config",
            "/etc/tuner.toml",
            "--poll-interval",
            "30",
            "--max-poll-cycles",
            "12",
            "--verbose",
            "step",
            "-",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/tuner.toml")));
        assert_eq!(cli.poll_interval, Some(30));
        assert_eq!(cli.max_poll_cycles, Some(12));
        assert!(matches!(cli.command, Command::Step { input } if input == "-"));
    }

    #[test]
    fn cli_parses_jobs_with_default_limit() {
        let cli = Cli::parse_from(["fmops-tuner", "jobs"]);
        assert!(matches!(cli.command, Command::Jobs { max_results: 20 }));
        assert!(!cli.verbose);
    }

    #[test]
    fn cli_parses_status_subcommand() {
        let cli = Cli::parse_from(["fmops-tuner", "status", "npc-TuningJob-1"]);
        match cli.command {
            Command::Status { job_name } => assert_eq!(job_name, "npc-TuningJob-1"),
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}

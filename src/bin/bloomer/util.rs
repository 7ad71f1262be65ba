use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;

use bloomer::{
    BloomEngine, BloomerConfig, ChannelStore, FileRecordStore, ProbeOrder, RecordStore,
    TcpSession,
};

use crate::cli::{Backend, FilterOpts};

pub type DynEngine = BloomEngine<Box<dyn RecordStore>>;

/// BLOOMER_* из окружения, поверх них флаги командной строки.
pub fn load_config(opts: &FilterOpts) -> Result<BloomerConfig> {
    let mut cfg = BloomerConfig::from_env();
    if let Some(m) = opts.bits {
        cfg = cfg.with_bit_count(m);
    }
    if let Some(k) = opts.hashes {
        cfg = cfg.with_hash_count(k);
    }
    if let Some(r) = opts.record_size {
        cfg = cfg.with_record_size(r);
    }
    if let Some(o) = &opts.order {
        cfg = cfg.with_probe_order(o.parse::<ProbeOrder>()?);
    }
    if let Some(n) = opts.retries {
        cfg = cfg.with_max_retries(n);
    }
    // валидация M/K/R сразу, до открытия хранилища
    cfg.params().context("invalid filter parameters")?;
    log::debug!("{}", cfg);
    Ok(cfg)
}

fn make_store(backend: &Backend, cfg: &BloomerConfig) -> Result<Box<dyn RecordStore>> {
    if let Some(path) = &backend.filter {
        return Ok(Box::new(FileRecordStore::new(path, cfg.record_size)));
    }
    match (&backend.drive, &backend.data) {
        (Some(cmd), Some(data)) => {
            let session = TcpSession::new(cmd.as_str(), data.as_str()).with_timeout(cfg.io_timeout());
            let store = ChannelStore::with_config(session, cfg)
                .with_file_name(backend.name.as_str())
                .with_channel(backend.channel);
            Ok(Box::new(store))
        }
        _ => Err(anyhow!("no filter backend: pass --filter PATH or --drive ADDR --data ADDR")),
    }
}

/// Открыть движок. Ошибка открытия фатальна для всей команды.
pub fn open_engine(backend: &Backend, cfg: &BloomerConfig) -> Result<DynEngine> {
    let params = cfg.params()?;
    let store = make_store(backend, cfg)?;
    let engine = BloomEngine::open(params, store).context("open filter store")?;
    Ok(engine.with_order(cfg.probe_order))
}

/// Слова из аргументов и/или файла ("-" = stdin).
pub fn collect_input(words: Vec<String>, words_file: Option<&Path>) -> Result<Vec<String>> {
    let mut out = words;
    if let Some(p) = words_file {
        let mut text = String::new();
        if p.as_os_str() == "-" {
            std::io::stdin()
                .read_to_string(&mut text)
                .context("read words from stdin")?;
        } else {
            OpenOptions::new()
                .read(true)
                .open(p)
                .and_then(|mut f| f.read_to_string(&mut text))
                .with_context(|| format!("read words file {}", p.display()))?;
        }
        out.extend(text.split_whitespace().map(str::to_string));
    }
    Ok(out)
}

use clap::Parser;
use log::info;
use tokio::net::TcpListener;

use crate::cli::{SubCommandExtend, check_hash_algorithm};
use crate::config::{HashOptions, SearchOptions};
use crate::engine::EngineBuilder;
use crate::{Opts, server};

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub hash: HashOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let engine = EngineBuilder::new(opts.conf_dir.clone())
            .algorithm(self.hash.hash)
            .timeout(self.search.timeout())
            .open()
            .await?;
        check_hash_algorithm(engine.store(), self.hash.hash, false).await?;

        // 创建应用状态
        let state = server::AppState::new(engine, self.search.page());

        // 创建应用
        let app = server::create_app(state);

        // 启动服务器
        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

use {
    super::TestResult,
    std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream},
    tokio::{
        sync::broadcast,
        time::{sleep, Duration},
    },
    url::Url,
    wallet_rpc::env::{AccountConfig, Config, RelayConfig, ServerConfig},
};

pub struct WalletRpc {
    pub public_addr: SocketAddr,
    pub private_addr: SocketAddr,
    shutdown_signal: broadcast::Sender<()>,
    is_shutdown: bool,
}

impl WalletRpc {
    pub async fn start(relay_url: Url) -> Self {
        Self::start_with_relay_timeout(relay_url, 5).await
    }

    pub async fn start_with_relay_timeout(relay_url: Url, timeout_secs: u64) -> Self {
        let public_port = get_random_port();
        let private_port = get_random_port();
        let hostname = Ipv4Addr::LOCALHOST;
        let public_addr = SocketAddr::new(IpAddr::V4(hostname), public_port);
        let private_addr = SocketAddr::new(IpAddr::V4(hostname), private_port);

        let (signal, shutdown) = broadcast::channel(1);

        let config = Config {
            server: ServerConfig {
                port: public_port,
                private_port,
                host: hostname.to_string(),
                log_level: "NONE".to_string(),
                ..Default::default()
            },
            relay: RelayConfig {
                url: relay_url,
                timeout_secs,
                paymaster_url: None,
                paymaster_hosts: Vec::new(),
            },
            account: AccountConfig::default(),
        };

        tokio::spawn(async move {
            if let Err(e) = wallet_rpc::bootstrap(shutdown, config).await {
                panic!("Server exited with error: {e:?}");
            }
        });

        if let Err(e) = wait_for_server_to_start(public_port).await {
            panic!("Failed to start server with error: {e:?}")
        }

        Self {
            public_addr,
            private_addr,
            shutdown_signal: signal,
            is_shutdown: false,
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.public_addr)
    }

    pub fn private_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.private_addr)
    }

    pub async fn shutdown(&mut self) {
        if self.is_shutdown {
            return;
        }
        self.is_shutdown = true;
        let _ = self.shutdown_signal.send(());
        wait_for_server_to_shutdown(self.public_addr.port())
            .await
            .unwrap();
    }
}

// Finds a free port.
fn get_random_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};

    static NEXT_PORT: AtomicU16 = AtomicU16::new(9000);

    loop {
        let port = NEXT_PORT.fetch_add(1, Ordering::SeqCst);

        if is_port_available(port) {
            return port;
        }
    }
}

fn is_port_available(port: u16) -> bool {
    TcpStream::connect(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)).is_err()
}

async fn wait_for_server_to_shutdown(port: u16) -> TestResult<()> {
    let poll_fut = async {
        while !is_port_available(port) {
            sleep(Duration::from_millis(10)).await;
        }
    };

    Ok(tokio::time::timeout(Duration::from_secs(3), poll_fut).await?)
}

async fn wait_for_server_to_start(port: u16) -> TestResult<()> {
    let poll_fut = async {
        while is_port_available(port) {
            sleep(Duration::from_millis(10)).await;
        }
    };

    Ok(tokio::time::timeout(Duration::from_secs(5), poll_fut).await?)
}

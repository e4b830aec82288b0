use tempo_engine::uci::uci_loop;

fn main() {
    env_logger::init();
    uci_loop();
}

fn main() {
	kg_explorer::init_logging();
	leptos::mount::mount_to_body(kg_explorer::App);
}

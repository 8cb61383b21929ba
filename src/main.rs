use flowsheet_editor;

fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // Run the flowsheet editor
    flowsheet_editor::run_app()
}

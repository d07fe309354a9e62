use nu_plugin::{serve_plugin, MsgPackSerializer};
use nu_plugin_biodiversity::BiodiversityPlugin;

fn main() {
    serve_plugin(&BiodiversityPlugin, MsgPackSerializer {})
}

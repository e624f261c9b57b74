mod rebuild_flow;

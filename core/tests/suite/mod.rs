mod session_flow;

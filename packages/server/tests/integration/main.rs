mod broadcast;
mod websocket;

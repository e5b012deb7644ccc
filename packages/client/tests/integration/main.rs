mod frames;
mod reconnect;
